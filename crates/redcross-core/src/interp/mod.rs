//! 1-D interpolation backends used for sub-pixel and sub-resolution resampling.

pub mod linear;
pub mod spline;

use serde::{Deserialize, Serialize};

use crate::error::{RedcrossError, Result};

pub use linear::LinearInterpolator;
pub use spline::CubicSpline;

/// A 1-D interpolant built once over `(x, y)` samples and evaluated repeatedly.
pub trait Interpolate: Send + Sync {
    /// Evaluate the interpolant at `x`.
    fn eval(&self, x: f64) -> f64;

    /// Closed interval spanned by the knots.
    fn domain(&self) -> (f64, f64);

    fn covers(&self, x: f64) -> bool {
        let (lo, hi) = self.domain();
        x >= lo && x <= hi
    }

    fn sample(&self, xs: &[f64]) -> Vec<f64> {
        xs.iter().map(|&x| self.eval(x)).collect()
    }
}

/// Interpolation strategy for resampling templates and frames.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterpolationMode {
    /// Piecewise-linear; robust at any sampling density.
    #[default]
    Linear,
    /// Natural cubic spline; smoother, but ill-conditioned for near-duplicate knots.
    Spline,
}

impl std::fmt::Display for InterpolationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Linear => write!(f, "Linear"),
            Self::Spline => write!(f, "Cubic Spline"),
        }
    }
}

impl InterpolationMode {
    /// Build the selected interpolant over `(x, y)`.
    pub fn build(self, x: &[f64], y: &[f64]) -> Result<Box<dyn Interpolate>> {
        match self {
            Self::Linear => Ok(Box::new(LinearInterpolator::new(x, y)?)),
            Self::Spline => Ok(Box::new(CubicSpline::new(x, y)?)),
        }
    }
}

/// Shared knot validation: equal lengths, finite, strictly increasing.
pub(crate) fn validate_knots(x: &[f64], y: &[f64], min_points: usize) -> Result<()> {
    if x.len() != y.len() {
        return Err(RedcrossError::ShapeMismatch {
            expected: format!("{} knot values", x.len()),
            actual: format!("{} values", y.len()),
        });
    }
    if x.len() < min_points {
        return Err(RedcrossError::DegenerateInput(format!(
            "{} samples, need at least {min_points} to interpolate",
            x.len()
        )));
    }
    if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
        return Err(RedcrossError::DegenerateInput(
            "interpolation knots contain missing values".into(),
        ));
    }
    if x.windows(2).any(|w| w[1] <= w[0]) {
        return Err(RedcrossError::DegenerateInput(
            "interpolation abscissae are not strictly increasing".into(),
        ));
    }
    Ok(())
}

/// Index `i` of the segment `[x[i], x[i+1]]` used for `t`, clamped to the end segments.
pub(crate) fn segment_index(x: &[f64], t: f64) -> usize {
    let upper = x.partition_point(|&v| v <= t);
    upper.saturating_sub(1).min(x.len() - 2)
}
