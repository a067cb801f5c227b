use std::time::Instant;

use ndarray::{Array1, Array2, Axis};
use tracing::{debug, info};

use crate::error::{RedcrossError, Result};
use crate::grid::VelocityGrid;
use crate::interp::{Interpolate, LinearInterpolator};
use crate::parallel::map_indexed;
use crate::pipeline::config::{CcfConfig, NoiseMode};
use crate::spectrum::{SpectralSeries, Template};
use crate::stats;

use super::map::CcfMap;
use super::projector::{doppler_factors, DopplerProjector};

/// Computes CCF maps of spectral series against a template over a trial-velocity grid.
#[derive(Clone, Debug)]
pub struct CrossCorrelator {
    config: CcfConfig,
    grid: VelocityGrid,
    projector: DopplerProjector,
}

impl CrossCorrelator {
    pub fn new(config: CcfConfig) -> Result<Self> {
        let grid = config.velocities.build()?;
        Ok(Self::with_grid(config, grid))
    }

    /// Use an explicit trial-velocity grid instead of the configured one.
    pub fn with_grid(config: CcfConfig, grid: VelocityGrid) -> Self {
        let projector = DopplerProjector::new(config.interpolation, config.window);
        Self {
            config,
            grid,
            projector,
        }
    }

    pub fn grid(&self) -> &VelocityGrid {
        &self.grid
    }

    pub fn config(&self) -> &CcfConfig {
        &self.config
    }

    /// CCF map of a single order, shape `(n_obs, n_rv)`.
    ///
    /// Pixels with a missing wavelength or any missing flux (or flux error,
    /// when weighting by it) are excluded. Each frame is mean-centered and
    /// weighted by the configured noise model before a single matrix product
    /// with the Doppler-shifted template matrix.
    pub fn cross_correlate(&self, series: &SpectralSeries, template: &Template) -> Result<Array2<f64>> {
        let flux = series.flux();
        let flux_err = match self.config.noise {
            NoiseMode::FluxErr => Some(series.flux_err().ok_or_else(|| {
                RedcrossError::Configuration("noise mode FluxErr requires flux errors".into())
            })?),
            _ => None,
        };

        let usable: Vec<usize> = (0..series.n_pix())
            .filter(|&p| {
                series.wave()[p].is_finite()
                    && flux.column(p).iter().all(|v| v.is_finite())
                    && flux_err.map_or(true, |err| err.column(p).iter().all(|v| v.is_finite()))
            })
            .collect();
        if usable.len() < 2 {
            return Err(RedcrossError::DegenerateInput(format!(
                "{} usable pixels in order",
                usable.len()
            )));
        }

        let wave: Vec<f64> = usable.iter().map(|&p| series.wave()[p]).collect();
        let mut f = flux.select(Axis(1), &usable);
        for mut row in f.axis_iter_mut(Axis(0)) {
            let mean = row.mean().unwrap_or(0.0);
            row -= mean;
        }

        let (wave_min, wave_max) = wave
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &w| (lo.min(w), hi.max(w)));
        let cropped = template.crop(wave_min, wave_max, self.config.crop_eps)?;
        let g = self.projector.project(&cropped, &wave, &self.grid)?;

        let noise2: Array1<f64> = match flux_err {
            Some(err) => err
                .select(Axis(1), &usable)
                .mapv(|e| e * e)
                .mean_axis(Axis(0))
                .ok_or(RedcrossError::EmptySequence)?,
            None if self.config.noise == NoiseMode::Var => f.var_axis(Axis(0), 0.0),
            None => Array1::ones(wave.len()),
        };
        if let Some(p) = noise2.iter().position(|v| !(v.is_finite() && *v > 0.0)) {
            return Err(RedcrossError::DegenerateInput(format!(
                "noise weight at pixel {} is zero or missing ({} mode)",
                usable[p], self.config.noise
            )));
        }

        let weighted = &f / &noise2;
        Ok(weighted.dot(&g.t()))
    }

    /// CCF map summed over orders. Orders are correlated independently and
    /// reduced in order index.
    pub fn run(&self, orders: &[SpectralSeries], template: &Template) -> Result<CcfMap> {
        let first = orders.first().ok_or(RedcrossError::EmptySequence)?;
        let n_obs = first.n_obs();
        if let Some((o, bad)) = orders.iter().enumerate().find(|(_, s)| s.n_obs() != n_obs) {
            return Err(RedcrossError::GridMismatch(format!(
                "order {o} has {} frames, order 0 has {n_obs}",
                bad.n_obs()
            )));
        }

        let start = Instant::now();
        let maps = map_indexed(orders.len(), self.config.parallelism, |o| {
            let map = self.cross_correlate(&orders[o], template)?;
            debug!(order = o, "Order cross-correlated");
            Ok(map)
        })?;

        let mut total = Array2::<f64>::zeros((n_obs, self.grid.len()));
        for map in &maps {
            total += map;
        }

        info!(
            orders = orders.len(),
            frames = n_obs,
            n_rv = self.grid.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "CCF map computed"
        );
        CcfMap::new(self.grid.clone(), total, first.frame)
    }

    /// Self-normalized CCF of the template against its own Doppler-shifted copies.
    ///
    /// The outer tenth of the template on each side is dropped from the
    /// correlated flux; each value is divided by the sum of its shifted row.
    pub fn autoccf(&self, template: &Template) -> Result<Array1<f64>> {
        let n = template.len();
        let edge = n / 10;
        if n < 2 * edge + 2 {
            return Err(RedcrossError::DegenerateInput(format!(
                "template of {n} samples is too short for a self-CCF"
            )));
        }
        let wave = template.wave().slice(ndarray::s![edge..n - edge]).to_vec();
        let flux = template.flux().slice(ndarray::s![edge..n - edge]).to_owned();

        let fill = stats::median(&flux.to_vec());
        let interpolant =
            LinearInterpolator::new(&template.wave().to_vec(), &template.flux().to_vec())?
                .with_fill(fill);

        let betas = doppler_factors(&self.grid);
        let mut out = Array1::<f64>::zeros(betas.len());
        for (k, &beta) in betas.iter().enumerate() {
            let shifted = Array1::from_iter(wave.iter().map(|&w| interpolant.eval(w * beta)));
            let divide = shifted.sum();
            if divide == 0.0 || !divide.is_finite() {
                return Err(RedcrossError::DegenerateInput(format!(
                    "shifted template sums to {divide} at trial velocity {}",
                    self.grid.values()[k]
                )));
            }
            out[k] = flux.dot(&shifted) / divide;
        }
        Ok(out)
    }
}
