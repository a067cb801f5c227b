use std::time::Instant;

use ndarray::{Array1, Array2, Axis};
use tracing::info;

use crate::ccf::CcfMap;
use crate::consts::{DEFAULT_BKG_FRACTION, GRID_EPSILON};
use crate::ephemeris::PlanetEphemeris;
use crate::error::{RedcrossError, Result};
use crate::interp::{Interpolate, LinearInterpolator};
use crate::parallel::map_indexed;
use crate::pipeline::config::KpvConfig;

use super::map::KpvMap;

/// Re-projects a CCF map onto a Kp x Vrest grid.
///
/// Construction fixes the grids and background threshold; [`KpvMapper::run`]
/// builds a fresh [`KpvMap`] each time it is called.
pub struct KpvMapper<'a> {
    ccf: &'a CcfMap,
    ephemeris: &'a dyn PlanetEphemeris,
    parallelism: usize,
    kp_vec: Array1<f64>,
    vrest_vec: Array1<f64>,
    bkg: f64,
}

impl<'a> KpvMapper<'a> {
    pub fn new(
        ccf: &'a CcfMap,
        ephemeris: &'a dyn PlanetEphemeris,
        config: &KpvConfig,
    ) -> Result<Self> {
        if ephemeris.n_obs() != ccf.n_obs() {
            return Err(RedcrossError::GridMismatch(format!(
                "ephemeris has {} frames, CCF map has {}",
                ephemeris.n_obs(),
                ccf.n_obs()
            )));
        }
        let d_rv = config.delta_rv.unwrap_or_else(|| ccf.step());
        if !(d_rv.is_finite() && d_rv > 0.0) {
            return Err(RedcrossError::Configuration(format!("invalid Kp-Vsys step {d_rv}")));
        }
        if config.kp_radius <= 0.0 || config.vrest_max <= 0.0 {
            return Err(RedcrossError::Configuration(format!(
                "kp_radius ({}) and vrest_max ({}) must be positive",
                config.kp_radius, config.vrest_max
            )));
        }

        // [kp0 - radius, kp0 + radius)
        let n_kp = (2.0 * config.kp_radius / d_rv - GRID_EPSILON).ceil().max(0.0) as usize;
        let kp0 = ephemeris.kp();
        let kp_vec = Array1::from_iter((0..n_kp).map(|i| kp0 - config.kp_radius + i as f64 * d_rv));

        // [-vrest_max, vrest_max]
        let n_vrest = (2.0 * config.vrest_max / d_rv + GRID_EPSILON).floor() as usize + 1;
        let vrest_vec =
            Array1::from_iter((0..n_vrest).map(|i| -config.vrest_max + i as f64 * d_rv));
        if kp_vec.is_empty() || vrest_vec.len() < 2 {
            return Err(RedcrossError::Configuration(format!(
                "step {d_rv} km/s is too coarse for Kp radius {} and Vrest range +/-{}",
                config.kp_radius, config.vrest_max
            )));
        }

        let bkg = config.bkg.unwrap_or(DEFAULT_BKG_FRACTION * config.vrest_max);
        if !vrest_vec.iter().any(|v| v.abs() > bkg) {
            return Err(RedcrossError::Configuration(format!(
                "background threshold {bkg} km/s leaves no background in +/-{} km/s",
                config.vrest_max
            )));
        }

        check_coverage(ccf, ephemeris, &kp_vec, &vrest_vec)?;

        Ok(Self {
            ccf,
            ephemeris,
            parallelism: config.parallelism,
            kp_vec,
            vrest_vec,
            bkg,
        })
    }

    pub fn kp_vec(&self) -> &Array1<f64> {
        &self.kp_vec
    }

    pub fn vrest_vec(&self) -> &Array1<f64> {
        &self.vrest_vec
    }

    pub fn bkg(&self) -> f64 {
        self.bkg
    }

    /// Stack every included frame's CCF, shifted by its predicted planet RV,
    /// for each trial Kp.
    pub fn run(&self, ignore_eclipse: bool) -> Result<KpvMap> {
        let start = Instant::now();
        let n_obs = self.ccf.n_obs();

        let included: Vec<usize> = if ignore_eclipse {
            let mask = self.ephemeris.eclipse_mask();
            if mask.len() != n_obs {
                return Err(RedcrossError::GridMismatch(format!(
                    "eclipse mask has {} frames, CCF map has {n_obs}",
                    mask.len()
                )));
            }
            (0..n_obs).filter(|&i| !mask[i]).collect()
        } else {
            (0..n_obs).collect()
        };
        if included.is_empty() {
            return Err(RedcrossError::DegenerateInput(
                "every frame is masked by the eclipse".into(),
            ));
        }

        let rv = self.ccf.rv().as_slice();
        let interpolants = included
            .iter()
            .map(|&i| LinearInterpolator::new(rv, &self.ccf.values().row(i).to_vec()))
            .collect::<Result<Vec<_>>>()?;

        let frame = self.ccf.frame();
        let rows = map_indexed(self.kp_vec.len(), self.parallelism, |ikp| {
            let planet_rv = self.ephemeris.radial_velocity(self.kp_vec[ikp], frame);
            if planet_rv.len() != n_obs {
                return Err(RedcrossError::GridMismatch(format!(
                    "ephemeris returned {} velocities for {n_obs} frames",
                    planet_rv.len()
                )));
            }
            let mut row = Array1::<f64>::zeros(self.vrest_vec.len());
            for (&i, interpolant) in included.iter().zip(&interpolants) {
                for (dst, &v) in row.iter_mut().zip(&self.vrest_vec) {
                    *dst += interpolant.eval(v + planet_rv[i]);
                }
            }
            Ok(row)
        })?;

        let mut ccf_map = Array2::<f64>::zeros((self.kp_vec.len(), self.vrest_vec.len()));
        for (mut dst, row) in ccf_map.axis_iter_mut(Axis(0)).zip(rows) {
            dst.assign(&row);
        }

        info!(
            n_kp = self.kp_vec.len(),
            n_vrest = self.vrest_vec.len(),
            frames = included.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Kp-Vsys map computed"
        );
        KpvMap::new(self.kp_vec.clone(), self.vrest_vec.clone(), ccf_map, self.bkg)
    }
}

/// Every `vrest + planet_rv` lookup must fall inside the CCF velocity grid.
fn check_coverage(
    ccf: &CcfMap,
    ephemeris: &dyn PlanetEphemeris,
    kp_vec: &Array1<f64>,
    vrest_vec: &Array1<f64>,
) -> Result<()> {
    let (rv_min, rv_max) = (ccf.rv().first(), ccf.rv().last());
    let (vrest_min, vrest_max) = (vrest_vec[0], vrest_vec[vrest_vec.len() - 1]);
    for &kp in kp_vec {
        let planet_rv = ephemeris.radial_velocity(kp, ccf.frame());
        if planet_rv.len() != ccf.n_obs() {
            return Err(RedcrossError::GridMismatch(format!(
                "ephemeris returned {} velocities for {} frames",
                planet_rv.len(),
                ccf.n_obs()
            )));
        }
        for (i, &p) in planet_rv.iter().enumerate() {
            if vrest_min + p < rv_min || vrest_max + p > rv_max {
                return Err(RedcrossError::Configuration(format!(
                    "Vrest +/-{vrest_max:.2} + planet RV {p:.2} km/s (Kp {kp:.2}, frame {i}) \
                     is outside the CCF grid [{rv_min:.2}, {rv_max:.2}]"
                )));
            }
        }
    }
    Ok(())
}
