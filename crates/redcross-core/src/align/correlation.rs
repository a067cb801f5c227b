use crate::consts::MIN_SPLINE_POINTS;
use crate::error::{RedcrossError, Result};
use crate::grid::VelocityGrid;
use crate::interp::InterpolationMode;
use crate::stats;

/// Normalized cross-correlation coefficient of two equal-length signals.
///
/// `CC = (f·g / n) / sqrt((f·f / n) (g·g / n))`. Returns 0 when either
/// signal has zero power.
pub fn correlation_coefficient(f: &[f64], g: &[f64]) -> f64 {
    let n = f.len().min(g.len());
    if n == 0 {
        return 0.0;
    }
    let nf = n as f64;
    let (mut r, mut ff, mut gg) = (0.0, 0.0, 0.0);
    for (a, b) in f.iter().zip(g) {
        r += a * b;
        ff += a * a;
        gg += b * b;
    }
    let denom = ((ff / nf) * (gg / nf)).sqrt();
    if denom > 0.0 {
        (r / nf) / denom
    } else {
        0.0
    }
}

/// Replace values farther than `sigma` standard deviations from the mean with NaN.
pub fn sigma_clip(values: &[f64], sigma: f64) -> Vec<f64> {
    let valid = stats::finite(values);
    let mean = stats::mean(&valid);
    let std = stats::std_dev(&valid);
    values
        .iter()
        .map(|&v| {
            if !v.is_finite() || (v - mean).abs() > std * sigma {
                f64::NAN
            } else {
                v
            }
        })
        .collect()
}

/// Correlation coefficient of `reference` against `target` shifted by each trial shift.
///
/// Both frames are sigma-clipped and only pixels valid in both are used. The
/// target is interpolated over its valid pixel positions and evaluated at
/// `pixel + shift`.
pub fn shift_curve(
    reference: &[f64],
    target: &[f64],
    shifts: &VelocityGrid,
    clip: f64,
    interpolation: InterpolationMode,
) -> Result<Vec<f64>> {
    if reference.len() != target.len() {
        return Err(RedcrossError::ShapeMismatch {
            expected: format!("{} pixels", reference.len()),
            actual: format!("{} pixels", target.len()),
        });
    }
    let f = sigma_clip(reference, clip);
    let g = sigma_clip(target, clip);

    let valid: Vec<usize> = (0..f.len())
        .filter(|&i| f[i].is_finite() && g[i].is_finite())
        .collect();
    if valid.len() < MIN_SPLINE_POINTS {
        return Err(RedcrossError::DegenerateInput(format!(
            "{} valid pixels after clipping, need at least {MIN_SPLINE_POINTS}",
            valid.len()
        )));
    }

    let pixels: Vec<f64> = valid.iter().map(|&i| i as f64).collect();
    let f_valid: Vec<f64> = valid.iter().map(|&i| f[i]).collect();
    let g_valid: Vec<f64> = valid.iter().map(|&i| g[i]).collect();
    let interpolant = interpolation.build(&pixels, &g_valid)?;

    // Linear interpolants return NaN past the last valid pixel; those pairs are dropped.
    let mut f_used = Vec::with_capacity(pixels.len());
    let mut g_used = Vec::with_capacity(pixels.len());
    Ok(shifts
        .as_slice()
        .iter()
        .map(|&s| {
            f_used.clear();
            g_used.clear();
            for (&p, &fv) in pixels.iter().zip(&f_valid) {
                let gv = interpolant.eval(p + s);
                if gv.is_finite() {
                    f_used.push(fv);
                    g_used.push(gv);
                }
            }
            correlation_coefficient(&f_used, &g_used)
        })
        .collect())
}
