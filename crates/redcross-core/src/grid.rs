use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::consts::GRID_UNIFORMITY_TOLERANCE;
use crate::error::{RedcrossError, Result};

/// Ordered, evenly spaced grid of trial velocities (km/s) or trial shifts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VelocityGrid {
    values: Array1<f64>,
    step: f64,
}

impl VelocityGrid {
    /// Wrap an existing grid, checking that it is increasing and uniform.
    pub fn new(values: Array1<f64>) -> Result<Self> {
        if values.len() < 2 {
            return Err(RedcrossError::GridMismatch(format!(
                "grid needs at least two points, got {}",
                values.len()
            )));
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(RedcrossError::GridMismatch(
                "grid contains missing values".into(),
            ));
        }
        let n = values.len();
        let step = (values[n - 1] - values[0]) / (n - 1) as f64;
        if step <= 0.0 {
            return Err(RedcrossError::GridMismatch(
                "grid must be strictly increasing".into(),
            ));
        }
        let tolerance = GRID_UNIFORMITY_TOLERANCE * step;
        let irregular = values
            .windows(2)
            .into_iter()
            .any(|w| ((w[1] - w[0]) - step).abs() > tolerance);
        if irregular {
            return Err(RedcrossError::GridMismatch(format!(
                "grid spacing is not uniform (mean step {step})"
            )));
        }
        Ok(Self { values, step })
    }

    /// `[start, stop)` in increments of `step`, like `numpy.arange`.
    pub fn arange(start: f64, stop: f64, step: f64) -> Result<Self> {
        if step <= 0.0 || !step.is_finite() || stop <= start {
            return Err(RedcrossError::GridMismatch(format!(
                "cannot build grid from {start} to {stop} in steps of {step}"
            )));
        }
        let n = ((stop - start) / step).ceil() as usize;
        let values = Array1::from_iter((0..n).map(|i| start + i as f64 * step));
        Self::new(values)
    }

    pub fn values(&self) -> &Array1<f64> {
        &self.values
    }

    pub fn as_slice(&self) -> &[f64] {
        self.values.as_slice().unwrap_or(&[])
    }

    /// Grid resolution (mean spacing).
    pub fn step(&self) -> f64 {
        self.step
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn first(&self) -> f64 {
        self.values[0]
    }

    pub fn last(&self) -> f64 {
        self.values[self.values.len() - 1]
    }
}

/// Serializable description of an `arange`-style grid.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VelocityGridConfig {
    pub start: f64,
    pub stop: f64,
    pub step: f64,
}

impl VelocityGridConfig {
    pub fn build(&self) -> Result<VelocityGrid> {
        VelocityGrid::arange(self.start, self.stop, self.step)
    }
}

impl Default for VelocityGridConfig {
    fn default() -> Self {
        Self {
            start: -200.0,
            stop: 201.0,
            step: 1.0,
        }
    }
}

impl std::fmt::Display for VelocityGridConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}) step {}", self.start, self.stop, self.step)
    }
}
