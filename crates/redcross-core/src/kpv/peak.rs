use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::error::RedcrossError;

use super::fit::GaussianFit;

/// How to locate the peak of a Kp-Vsys significance surface.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum PeakQuery {
    /// Search |Kp - mean(Kp)| < 10 km/s and |Vrest| < 5 km/s.
    #[default]
    Auto,
    /// Fix Kp to the nearest grid row and search |Vrest| < 5 km/s.
    Kp(f64),
    /// Nearest grid point to an explicit position, no search.
    Position { vrest: f64, kp: f64 },
}

/// Location and significance of a Kp-Vsys peak.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PeakDescriptor {
    pub vrest: f64,
    pub kp: f64,
    pub snr: f64,
    pub kp_index: usize,
    pub vrest_index: usize,
}

/// Direction of a 1-D cut through the surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SliceAxis {
    /// Row at the peak Kp, as a function of Vrest.
    Horizontal,
    /// Column at the peak Vrest, as a function of Kp.
    Vertical,
}

impl std::fmt::Display for SliceAxis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Horizontal => write!(f, "Vrest"),
            Self::Vertical => write!(f, "Kp"),
        }
    }
}

/// A cut through the surface, with an optional Gaussian fit.
#[derive(Debug)]
pub struct Slice {
    pub axis: SliceAxis,
    pub x: Array1<f64>,
    pub y: Array1<f64>,
    /// `None` when no fit was requested.
    pub fit: Option<Result<GaussianFit, RedcrossError>>,
}

/// Peak location plus Gaussian fits of both slices through it.
///
/// A failed fit only marks that slice as unavailable.
#[derive(Debug)]
pub struct PeakReport {
    pub peak: PeakDescriptor,
    pub horizontal: Slice,
    pub vertical: Slice,
}

impl PeakReport {
    /// Fitted Vrest centre and width, if the horizontal fit succeeded.
    pub fn vrest_fit(&self) -> Option<&GaussianFit> {
        self.horizontal.fit.as_ref().and_then(|f| f.as_ref().ok())
    }

    /// Fitted Kp centre and width, if the vertical fit succeeded.
    pub fn kp_fit(&self) -> Option<&GaussianFit> {
        self.vertical.fit.as_ref().and_then(|f| f.as_ref().ok())
    }
}
