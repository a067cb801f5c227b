//! Planet radial-velocity interface consumed by the Kp-Vsys mapper.

use ndarray::Array1;

use crate::error::{RedcrossError, Result};
use crate::spectrum::RestFrame;

/// Per-frame planet radial velocities as a function of trial Kp.
///
/// Implementations are read-only: the mapper passes the trial Kp explicitly
/// instead of mutating the ephemeris.
pub trait PlanetEphemeris: Send + Sync {
    /// Nominal orbital semi-amplitude (km/s), the centre of the Kp grid.
    fn kp(&self) -> f64;

    /// Number of frames described.
    fn n_obs(&self) -> usize;

    /// Orbital phase of each frame.
    fn phase(&self) -> Array1<f64>;

    /// Planet radial velocity (km/s) of each frame for semi-amplitude `kp`,
    /// expressed in `frame`.
    fn radial_velocity(&self, kp: f64, frame: RestFrame) -> Array1<f64>;

    /// `true` for frames where the planet is eclipsed and must be excluded.
    fn eclipse_mask(&self) -> Array1<bool>;
}

/// Circular orbit: `RV = Kp sin(2 pi phase)` in the stellar rest frame.
///
/// Barycentric velocities add the systemic velocity; telluric velocities also
/// remove the barycentric Earth radial velocity (BERV) of each frame.
#[derive(Clone, Debug)]
pub struct CircularOrbit {
    pub kp: f64,
    pub v_sys: f64,
    phase: Array1<f64>,
    berv: Array1<f64>,
    /// Half-width of the secondary eclipse in phase units, centred on phase 0.5.
    pub eclipse_half_width: f64,
}

impl CircularOrbit {
    pub fn new(kp: f64, phase: Array1<f64>) -> Self {
        let n = phase.len();
        Self {
            kp,
            v_sys: 0.0,
            phase,
            berv: Array1::zeros(n),
            eclipse_half_width: 0.0,
        }
    }

    pub fn with_v_sys(mut self, v_sys: f64) -> Self {
        self.v_sys = v_sys;
        self
    }

    pub fn with_berv(mut self, berv: Array1<f64>) -> Result<Self> {
        if berv.len() != self.phase.len() {
            return Err(RedcrossError::GridMismatch(format!(
                "{} BERV values for {} frames",
                berv.len(),
                self.phase.len()
            )));
        }
        self.berv = berv;
        Ok(self)
    }

    pub fn with_eclipse_half_width(mut self, half_width: f64) -> Self {
        self.eclipse_half_width = half_width;
        self
    }
}

impl PlanetEphemeris for CircularOrbit {
    fn kp(&self) -> f64 {
        self.kp
    }

    fn n_obs(&self) -> usize {
        self.phase.len()
    }

    fn phase(&self) -> Array1<f64> {
        self.phase.clone()
    }

    fn radial_velocity(&self, kp: f64, frame: RestFrame) -> Array1<f64> {
        let orbital = self
            .phase
            .mapv(|p| kp * (std::f64::consts::TAU * p).sin());
        match frame {
            RestFrame::Planet => Array1::zeros(self.phase.len()),
            RestFrame::Stellar => orbital,
            RestFrame::Barycentric => orbital + self.v_sys,
            RestFrame::Telluric => orbital + self.v_sys - &self.berv,
        }
    }

    fn eclipse_mask(&self) -> Array1<bool> {
        self.phase
            .mapv(|p| (p.rem_euclid(1.0) - 0.5).abs() < self.eclipse_half_width)
    }
}
