use crate::consts::MIN_SPLINE_POINTS;
use crate::error::{RedcrossError, Result};

use super::{segment_index, validate_knots, Interpolate};

/// Natural cubic spline through every knot.
///
/// Points outside the knot range are evaluated on the end-segment cubic.
#[derive(Clone, Debug)]
pub struct CubicSpline {
    x: Vec<f64>,
    y: Vec<f64>,
    /// Second derivative at each knot.
    m: Vec<f64>,
}

impl CubicSpline {
    pub fn new(x: &[f64], y: &[f64]) -> Result<Self> {
        validate_knots(x, y, MIN_SPLINE_POINTS)?;
        let m = second_derivatives(x, y)?;
        Ok(Self {
            x: x.to_vec(),
            y: y.to_vec(),
            m,
        })
    }
}

impl Interpolate for CubicSpline {
    fn eval(&self, t: f64) -> f64 {
        let i = segment_index(&self.x, t);
        let h = self.x[i + 1] - self.x[i];
        let a = (self.x[i + 1] - t) / h;
        let b = (t - self.x[i]) / h;
        a * self.y[i]
            + b * self.y[i + 1]
            + ((a * a * a - a) * self.m[i] + (b * b * b - b) * self.m[i + 1]) * h * h / 6.0
    }

    fn domain(&self) -> (f64, f64) {
        (self.x[0], self.x[self.x.len() - 1])
    }
}

/// Solve the tridiagonal system for the knot second derivatives (Thomas algorithm).
fn second_derivatives(x: &[f64], y: &[f64]) -> Result<Vec<f64>> {
    let n = x.len();
    let mut m = vec![0.0; n];
    let mut c_prime = vec![0.0; n];
    let mut d_prime = vec![0.0; n];

    for i in 1..n - 1 {
        let h0 = x[i] - x[i - 1];
        let h1 = x[i + 1] - x[i];
        let lower = h0 / 6.0;
        let diag = (h0 + h1) / 3.0;
        let upper = h1 / 6.0;
        let rhs = (y[i + 1] - y[i]) / h1 - (y[i] - y[i - 1]) / h0;

        let denom = diag - lower * c_prime[i - 1];
        if denom.abs() < f64::EPSILON * diag.abs().max(1.0) || !denom.is_finite() {
            return Err(RedcrossError::DegenerateInput(
                "spline system is singular (knots too close together)".into(),
            ));
        }
        c_prime[i] = upper / denom;
        d_prime[i] = (rhs - lower * d_prime[i - 1]) / denom;
    }

    for i in (1..n - 1).rev() {
        m[i] = d_prime[i] - c_prime[i] * m[i + 1];
    }
    Ok(m)
}
