use ndarray::{Array1, Array2, Axis};
use tracing::{debug, info};

use crate::error::{RedcrossError, Result};
use crate::grid::VelocityGrid;
use crate::parallel::map_indexed;
use crate::pipeline::config::AlignConfig;
use crate::spectrum::SpectralSeries;
use crate::stats;

use super::correlation::shift_curve;

/// Per-frame shift estimates and the correlation curves they came from.
#[derive(Clone, Debug)]
pub struct AlignmentResult {
    /// Trial shifts (pixels).
    pub grid: VelocityGrid,
    /// Correlation coefficient per frame and trial shift, shape `(n_obs, n_shifts)`.
    pub ccf: Array2<f64>,
    /// Best shift per frame; the reference frame is always 0.
    pub shifts: Array1<f64>,
}

/// Estimates sub-pixel shifts of every frame relative to frame 0 and resamples
/// frames onto the reference pixel grid.
#[derive(Clone, Debug)]
pub struct FrameAligner {
    config: AlignConfig,
    grid: VelocityGrid,
}

impl FrameAligner {
    pub fn new(config: AlignConfig) -> Result<Self> {
        let grid = config.shifts.build()?;
        Ok(Self { config, grid })
    }

    pub fn grid(&self) -> &VelocityGrid {
        &self.grid
    }

    /// Measure the shift of each frame against frame 0.
    ///
    /// Callers normally pass a series already divided by its per-pixel
    /// median (see [`SpectralSeries::normalise`]).
    pub fn run(&self, series: &SpectralSeries) -> Result<AlignmentResult> {
        let flux = series.flux();
        let n_obs = series.n_obs();
        let reference = flux.row(0).to_vec();

        let curves = map_indexed(n_obs, self.config.parallelism, |j| {
            let curve = shift_curve(
                &reference,
                &flux.row(j).to_vec(),
                &self.grid,
                self.config.clip_sigma,
                self.config.interpolation,
            )
            .map_err(|e| match e {
                RedcrossError::DegenerateInput(msg) => {
                    RedcrossError::DegenerateInput(format!("frame {j}: {msg}"))
                }
                other => other,
            })?;
            debug!(frame = j, "Shift curve computed");
            Ok(curve)
        })?;

        let mut ccf = Array2::<f64>::zeros((n_obs, self.grid.len()));
        let mut shifts = Array1::<f64>::zeros(n_obs);
        for (j, curve) in curves.into_iter().enumerate() {
            if j > 0 {
                let best = stats::argmax(&curve).ok_or_else(|| {
                    RedcrossError::DegenerateInput(format!("frame {j}: empty shift curve"))
                })?;
                shifts[j] = self.grid.values()[best];
            }
            ccf.row_mut(j).assign(&Array1::from(curve));
        }

        info!(
            frames = n_obs,
            trial_shifts = self.grid.len(),
            max_abs_shift = shifts.iter().fold(0.0f64, |m, s| m.max(s.abs())),
            "Frame shifts measured"
        );
        Ok(AlignmentResult { grid: self.grid.clone(), ccf, shifts })
    }

    /// Resample every frame except the reference at `pixel + shift`.
    ///
    /// Returns a corrected copy; `series` is left untouched.
    pub fn apply_shifts(&self, series: &SpectralSeries, shifts: &Array1<f64>) -> Result<SpectralSeries> {
        if shifts.len() != series.n_obs() {
            return Err(RedcrossError::GridMismatch(format!(
                "{} shifts for {} frames",
                shifts.len(),
                series.n_obs()
            )));
        }
        let pixels: Vec<f64> = (0..series.n_pix()).map(|i| i as f64).collect();
        let flux = series.flux();

        let rows = map_indexed(series.n_obs(), self.config.parallelism, |j| {
            let row = flux.row(j).to_vec();
            if j == 0 {
                return Ok(row);
            }
            let interpolant = self.config.interpolation.build(&pixels, &row)?;
            let shifted: Vec<f64> = pixels.iter().map(|&p| p + shifts[j]).collect();
            Ok(interpolant.sample(&shifted))
        })?;

        let mut corrected = flux.clone();
        for (mut dst, row) in corrected.axis_iter_mut(Axis(0)).zip(rows) {
            dst.assign(&Array1::from(row));
        }
        series.with_flux(corrected)
    }

    /// Measure and apply shifts in one step.
    pub fn align(&self, series: &SpectralSeries) -> Result<(SpectralSeries, AlignmentResult)> {
        let result = self.run(series)?;
        let corrected = self.apply_shifts(series, &result.shifts)?;
        Ok((corrected, result))
    }
}
