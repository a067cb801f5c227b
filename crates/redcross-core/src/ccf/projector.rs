use ndarray::{Array2, Axis};

use crate::consts::SPEED_OF_LIGHT_KMS;
use crate::error::{RedcrossError, Result};
use crate::filters::high_pass_gaussian_rows;
use crate::grid::VelocityGrid;
use crate::interp::InterpolationMode;
use crate::spectrum::Template;

/// Low-velocity Doppler factors `beta = 1 - rv / c` for each trial velocity.
pub fn doppler_factors(grid: &VelocityGrid) -> Vec<f64> {
    grid.as_slice()
        .iter()
        .map(|rv| 1.0 - rv / SPEED_OF_LIGHT_KMS)
        .collect()
}

/// Builds the Doppler-shifted template matrix used by the CCF.
#[derive(Clone, Copy, Debug, Default)]
pub struct DopplerProjector {
    pub interpolation: InterpolationMode,
    /// High-pass window (samples) applied per row; 0 disables it.
    pub window: f64,
}

impl DopplerProjector {
    pub fn new(interpolation: InterpolationMode, window: f64) -> Self {
        Self { interpolation, window }
    }

    /// Evaluate `template` at `wave * beta_k` for every trial velocity.
    ///
    /// Returns a `(n_rv, wave.len())` matrix with every row mean-subtracted.
    /// Fails with a configuration error if any shifted wavelength falls
    /// outside the template's support.
    pub fn project(
        &self,
        template: &Template,
        wave: &[f64],
        grid: &VelocityGrid,
    ) -> Result<Array2<f64>> {
        if wave.is_empty() {
            return Err(RedcrossError::DegenerateInput(
                "no wavelength samples to project onto".into(),
            ));
        }
        let betas = doppler_factors(grid);
        let interpolant = self
            .interpolation
            .build(&template.wave().to_vec(), &template.flux().to_vec())?;

        let (wave_min, wave_max) = wave
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &w| (lo.min(w), hi.max(w)));
        let (beta_min, beta_max) = betas
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &b| (lo.min(b), hi.max(b)));
        let (lo, hi) = (wave_min * beta_min, wave_max * beta_max);
        if !interpolant.covers(lo) || !interpolant.covers(hi) {
            let (t_lo, t_hi) = interpolant.domain();
            return Err(RedcrossError::Configuration(format!(
                "shifted wavelengths [{lo:.5}, {hi:.5}] exceed template support [{t_lo:.5}, {t_hi:.5}]"
            )));
        }

        let mut g = Array2::<f64>::zeros((betas.len(), wave.len()));
        for (mut row, &beta) in g.axis_iter_mut(Axis(0)).zip(&betas) {
            for (dst, &w) in row.iter_mut().zip(wave) {
                *dst = interpolant.eval(w * beta);
            }
        }

        if self.window > 0.0 {
            g = high_pass_gaussian_rows(&g, self.window);
        }

        for mut row in g.axis_iter_mut(Axis(0)) {
            let mean = row.mean().unwrap_or(0.0);
            row -= mean;
        }
        Ok(g)
    }
}
