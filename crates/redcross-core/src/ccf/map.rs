use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::consts::{CCF_BKG_PERCENTILE, PLANET_FRAME_PERCENTILE};
use crate::ephemeris::PlanetEphemeris;
use crate::error::{RedcrossError, Result};
use crate::grid::VelocityGrid;
use crate::interp::{Interpolate, LinearInterpolator};
use crate::parallel::map_indexed;
use crate::spectrum::RestFrame;
use crate::stats;

/// Cross-correlation values per frame and trial velocity.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CcfMap {
    rv: VelocityGrid,
    /// Shape `(n_obs, n_rv)`.
    values: Array2<f64>,
    frame: RestFrame,
}

impl CcfMap {
    pub fn new(rv: VelocityGrid, values: Array2<f64>, frame: RestFrame) -> Result<Self> {
        if values.ncols() != rv.len() {
            return Err(RedcrossError::ShapeMismatch {
                expected: format!("{} trial velocities", rv.len()),
                actual: format!("{} columns", values.ncols()),
            });
        }
        Ok(Self { rv, values, frame })
    }

    pub fn rv(&self) -> &VelocityGrid {
        &self.rv
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn frame(&self) -> RestFrame {
        self.frame
    }

    pub fn n_obs(&self) -> usize {
        self.values.nrows()
    }

    /// Trial-velocity resolution (km/s).
    pub fn step(&self) -> f64 {
        self.rv.step()
    }

    /// Background-normalized map.
    ///
    /// Columns with |rv| above the 40th percentile of |rv| form the
    /// background; the map is shifted by its median and scaled by its
    /// standard deviation.
    pub fn snr(&self) -> Result<Array2<f64>> {
        let rv_abs: Vec<f64> = self.rv.as_slice().iter().map(|v| v.abs()).collect();
        let threshold = stats::percentile(&rv_abs, CCF_BKG_PERCENTILE);
        let columns: Vec<usize> = (0..rv_abs.len()).filter(|&k| rv_abs[k] > threshold).collect();
        let bkg: Vec<f64> = self.values.select(Axis(1), &columns).iter().copied().collect();

        let noise = stats::std_dev(&bkg);
        if bkg.is_empty() || noise.is_nan() || noise <= 0.0 {
            return Err(RedcrossError::DegenerateInput(
                "CCF background has no spread".into(),
            ));
        }
        let baseline = stats::median(&bkg);
        Ok((&self.values - baseline) / noise)
    }

    /// Shift every frame into the planet rest frame at the ephemeris' nominal Kp.
    ///
    /// Each row is linearly interpolated at `rv + RV_planet[i]` (zero outside
    /// the grid); only trial velocities with |rv| below the median |rv| are kept.
    pub fn to_planet_frame(
        &self,
        ephemeris: &dyn PlanetEphemeris,
        parallelism: usize,
    ) -> Result<CcfMap> {
        if ephemeris.n_obs() != self.n_obs() {
            return Err(RedcrossError::GridMismatch(format!(
                "ephemeris has {} frames, CCF map has {}",
                ephemeris.n_obs(),
                self.n_obs()
            )));
        }
        let planet_rv = ephemeris.radial_velocity(ephemeris.kp(), self.frame);
        let rv = self.rv.as_slice();

        let rows = map_indexed(self.n_obs(), parallelism, |i| {
            let row = self.values.row(i).to_vec();
            let interpolant = LinearInterpolator::new(rv, &row)?.with_fill(0.0);
            Ok(rv.iter().map(|v| interpolant.eval(v + planet_rv[i])).collect::<Vec<f64>>())
        })?;

        let rv_abs: Vec<f64> = rv.iter().map(|v| v.abs()).collect();
        let threshold = stats::percentile(&rv_abs, PLANET_FRAME_PERCENTILE);
        let keep: Vec<usize> = (0..rv.len()).filter(|&k| rv_abs[k] < threshold).collect();

        let mut shifted = Array2::<f64>::zeros((self.n_obs(), keep.len()));
        for (i, row) in rows.iter().enumerate() {
            for (dst, &k) in keep.iter().enumerate() {
                shifted[[i, dst]] = row[k];
            }
        }
        let grid = VelocityGrid::new(Array1::from_iter(keep.iter().map(|&k| rv[k])))?;
        debug!(kept = keep.len(), "CCF map moved to planet frame");
        CcfMap::new(grid, shifted, RestFrame::Planet)
    }
}
