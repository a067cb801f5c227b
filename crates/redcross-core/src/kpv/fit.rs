//! Bounded Levenberg-Marquardt fit of a Gaussian plus offset.

use serde::{Deserialize, Serialize};

use crate::consts::{FIT_MAX_ITERATIONS, FIT_TOLERANCE};
use crate::error::{RedcrossError, Result};
use crate::stats;

/// `offset + amplitude * exp(-(x - center)^2 / (2 sigma^2))`
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GaussianFit {
    pub amplitude: f64,
    pub center: f64,
    pub sigma: f64,
    pub offset: f64,
}

impl GaussianFit {
    pub fn eval(&self, x: f64) -> f64 {
        let d = x - self.center;
        self.offset + self.amplitude * (-d * d / (2.0 * self.sigma * self.sigma)).exp()
    }

    /// Full width at half maximum.
    pub fn fwhm(&self) -> f64 {
        2.0 * (2.0 * std::f64::consts::LN_2).sqrt() * self.sigma
    }

    fn to_array(self) -> [f64; 4] {
        [self.amplitude, self.center, self.sigma, self.offset]
    }

    fn from_array(p: [f64; 4]) -> Self {
        Self {
            amplitude: p[0],
            center: p[1],
            sigma: p[2],
            offset: p[3],
        }
    }
}

/// Box constraints on `[amplitude, center, sigma, offset]`.
#[derive(Clone, Copy, Debug)]
pub struct FitBounds {
    pub lower: [f64; 4],
    pub upper: [f64; 4],
}

impl FitBounds {
    fn clamp(&self, p: [f64; 4]) -> [f64; 4] {
        let mut out = p;
        for j in 0..4 {
            out[j] = p[j].clamp(self.lower[j], self.upper[j]);
        }
        out
    }
}

/// Fit a Gaussian to `(x, y)` within `bounds`.
pub fn fit_gaussian(x: &[f64], y: &[f64], bounds: &FitBounds) -> Result<GaussianFit> {
    if x.len() != y.len() || x.len() < 4 {
        return Err(RedcrossError::FitConvergence(format!(
            "need at least 4 paired samples, got {} x and {} y",
            x.len(),
            y.len()
        )));
    }
    if x.iter().chain(y).any(|v| !v.is_finite()) {
        return Err(RedcrossError::FitConvergence("samples contain missing values".into()));
    }

    let mut p = bounds.clamp(initial_guess(x, y).to_array());
    let mut chi2 = chi_square(x, y, p);
    let mut lambda = 1e-3;

    for _ in 0..FIT_MAX_ITERATIONS {
        let (jtj, jtr) = normal_equations(x, y, p);
        let mut a = jtj;
        for j in 0..4 {
            a[j][j] += lambda * jtj[j][j].max(1e-12);
        }

        if let Some(delta) = solve4(a, jtr) {
            let mut candidate = p;
            for j in 0..4 {
                candidate[j] += delta[j];
            }
            let candidate = bounds.clamp(candidate);
            let chi2_new = chi_square(x, y, candidate);
            if chi2_new.is_finite() && chi2_new <= chi2 {
                let improvement = chi2 - chi2_new;
                p = candidate;
                chi2 = chi2_new;
                lambda = (lambda / 10.0).max(1e-12);
                if improvement <= FIT_TOLERANCE * chi2.max(f64::MIN_POSITIVE) {
                    return finish(p);
                }
                continue;
            }
        }

        lambda *= 10.0;
        if lambda > 1e12 {
            // No downhill step remains: at a (bounded) minimum.
            return finish(p);
        }
    }

    Err(RedcrossError::FitConvergence(format!(
        "no convergence after {FIT_MAX_ITERATIONS} iterations"
    )))
}

fn finish(p: [f64; 4]) -> Result<GaussianFit> {
    let fit = GaussianFit::from_array(p);
    if p.iter().any(|v| !v.is_finite()) || fit.sigma <= 0.0 {
        return Err(RedcrossError::FitConvergence(format!("degenerate solution {fit:?}")));
    }
    Ok(fit)
}

fn initial_guess(x: &[f64], y: &[f64]) -> GaussianFit {
    let (lo, hi) = y
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    let peak = stats::argmax(y).unwrap_or(0);
    let span = x[x.len() - 1] - x[0];
    GaussianFit {
        amplitude: hi - lo,
        center: x[peak],
        sigma: (span.abs() / 6.0).max(f64::EPSILON),
        offset: stats::median(y).min(lo + 0.5 * (hi - lo)),
    }
}

fn chi_square(x: &[f64], y: &[f64], p: [f64; 4]) -> f64 {
    let model = GaussianFit::from_array(p);
    x.iter()
        .zip(y)
        .map(|(&xi, &yi)| {
            let r = yi - model.eval(xi);
            r * r
        })
        .sum()
}

/// `J^T J` and `J^T r` for the current parameters.
fn normal_equations(x: &[f64], y: &[f64], p: [f64; 4]) -> ([[f64; 4]; 4], [f64; 4]) {
    let [a, x0, sigma, _] = p;
    let model = GaussianFit::from_array(p);
    let mut jtj = [[0.0; 4]; 4];
    let mut jtr = [0.0; 4];
    for (&xi, &yi) in x.iter().zip(y) {
        let d = xi - x0;
        let e = (-d * d / (2.0 * sigma * sigma)).exp();
        let grad = [
            e,
            a * e * d / (sigma * sigma),
            a * e * d * d / (sigma * sigma * sigma),
            1.0,
        ];
        let r = yi - model.eval(xi);
        for j in 0..4 {
            jtr[j] += grad[j] * r;
            for k in 0..4 {
                jtj[j][k] += grad[j] * grad[k];
            }
        }
    }
    (jtj, jtr)
}

/// Gaussian elimination with partial pivoting; `None` when singular.
fn solve4(mut a: [[f64; 4]; 4], mut b: [f64; 4]) -> Option<[f64; 4]> {
    for col in 0..4 {
        let pivot = (col..4).max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))?;
        if a[pivot][col].abs() < 1e-300 || !a[pivot][col].is_finite() {
            return None;
        }
        a.swap(col, pivot);
        b.swap(col, pivot);
        for row in col + 1..4 {
            let factor = a[row][col] / a[col][col];
            for k in col..4 {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }
    let mut out = [0.0; 4];
    for row in (0..4).rev() {
        let tail: f64 = (row + 1..4).map(|k| a[row][k] * out[k]).sum();
        out[row] = (b[row] - tail) / a[row][row];
    }
    Some(out)
}
