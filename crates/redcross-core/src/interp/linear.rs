use crate::error::Result;

use super::{segment_index, validate_knots, Interpolate};

/// Piecewise-linear interpolant.
///
/// Outside the knot range it returns the configured fill value, or NaN when
/// none is set.
#[derive(Clone, Debug)]
pub struct LinearInterpolator {
    x: Vec<f64>,
    y: Vec<f64>,
    fill: Option<f64>,
}

impl LinearInterpolator {
    pub fn new(x: &[f64], y: &[f64]) -> Result<Self> {
        validate_knots(x, y, 2)?;
        Ok(Self {
            x: x.to_vec(),
            y: y.to_vec(),
            fill: None,
        })
    }

    /// Return `value` for points outside the knot range instead of NaN.
    pub fn with_fill(mut self, value: f64) -> Self {
        self.fill = Some(value);
        self
    }
}

impl Interpolate for LinearInterpolator {
    fn eval(&self, t: f64) -> f64 {
        if !self.covers(t) {
            return self.fill.unwrap_or(f64::NAN);
        }
        let i = segment_index(&self.x, t);
        let (x0, x1) = (self.x[i], self.x[i + 1]);
        let frac = (t - x0) / (x1 - x0);
        self.y[i] + frac * (self.y[i + 1] - self.y[i])
    }

    fn domain(&self) -> (f64, f64) {
        (self.x[0], self.x[self.x.len() - 1])
    }
}
