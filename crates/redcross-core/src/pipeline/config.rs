use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_CLIP_SIGMA, DEFAULT_CROP_EPS, DEFAULT_KP_RADIUS, DEFAULT_VREST_MAX};
use crate::grid::VelocityGridConfig;
use crate::interp::InterpolationMode;

/// Full analysis configuration: optional frame alignment, CCF and Kp-Vsys stages.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub align: Option<AlignConfig>,
    #[serde(default)]
    pub ccf: CcfConfig,
    #[serde(default)]
    pub kpv: KpvConfig,
}

/// Pixel-shift alignment of frames against the first frame.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AlignConfig {
    /// Trial pixel shifts.
    pub shifts: VelocityGridConfig,
    /// Values beyond `clip_sigma` standard deviations are masked before correlating.
    pub clip_sigma: f64,
    #[serde(default = "default_spline")]
    pub interpolation: InterpolationMode,
    #[serde(default)]
    pub parallelism: usize,
}

fn default_spline() -> InterpolationMode {
    InterpolationMode::Spline
}

impl Default for AlignConfig {
    fn default() -> Self {
        Self {
            shifts: VelocityGridConfig {
                start: -10.0,
                stop: 10.2,
                step: 0.1,
            },
            clip_sigma: DEFAULT_CLIP_SIGMA,
            interpolation: InterpolationMode::Spline,
            parallelism: 0,
        }
    }
}

/// Noise weighting applied to the flux before the CCF dot product.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoiseMode {
    /// Per-pixel variance of the centered flux across frames.
    #[default]
    Var,
    /// Per-pixel mean squared flux uncertainty across frames.
    FluxErr,
    /// Uniform weights.
    Ones,
}

impl std::fmt::Display for NoiseMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Var => write!(f, "Variance"),
            Self::FluxErr => write!(f, "Flux Error"),
            Self::Ones => write!(f, "Uniform"),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CcfConfig {
    /// Trial radial velocities (km/s).
    pub velocities: VelocityGridConfig,
    pub interpolation: InterpolationMode,
    pub noise: NoiseMode,
    /// High-pass window (samples) applied to each shifted template row; 0 disables it.
    pub window: f64,
    /// Fractional margin kept around the data range when cropping the template.
    pub crop_eps: f64,
    #[serde(default)]
    pub parallelism: usize,
}

impl Default for CcfConfig {
    fn default() -> Self {
        Self {
            velocities: VelocityGridConfig::default(),
            interpolation: InterpolationMode::Linear,
            noise: NoiseMode::Var,
            window: 0.0,
            crop_eps: DEFAULT_CROP_EPS,
            parallelism: 0,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct KpvConfig {
    /// Half-width of the Kp grid around the nominal Kp (km/s).
    pub kp_radius: f64,
    /// Vrest grid spans `[-vrest_max, vrest_max]` (km/s).
    pub vrest_max: f64,
    /// Background threshold on |Vrest|; defaults to 60% of `vrest_max`.
    pub bkg: Option<f64>,
    /// Grid resolution; defaults to the CCF trial-velocity step.
    pub delta_rv: Option<f64>,
    /// Drop in-eclipse frames from the stack.
    pub ignore_eclipse: bool,
    #[serde(default)]
    pub parallelism: usize,
}

impl Default for KpvConfig {
    fn default() -> Self {
        Self {
            kp_radius: DEFAULT_KP_RADIUS,
            vrest_max: DEFAULT_VREST_MAX,
            bkg: None,
            delta_rv: None,
            ignore_eclipse: true,
            parallelism: 0,
        }
    }
}
