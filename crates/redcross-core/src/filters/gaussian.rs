use ndarray::{Array2, Axis};
use rayon::prelude::*;

use crate::consts::{GAUSSIAN_TRUNCATE, PARALLEL_FRAME_THRESHOLD};

/// Smooth a 1-D signal with a Gaussian kernel of standard deviation `sigma` samples.
///
/// Edges are handled by half-sample reflection (`d c b a | a b c d | d c b a`).
/// A non-positive `sigma` returns the input unchanged.
pub fn gaussian_filter(data: &[f64], sigma: f64) -> Vec<f64> {
    if sigma <= 0.0 || data.is_empty() {
        return data.to_vec();
    }
    let kernel = make_gaussian_kernel(sigma);
    let radius = (kernel.len() / 2) as isize;
    let n = data.len() as isize;

    (0..n)
        .map(|i| {
            kernel
                .iter()
                .enumerate()
                .map(|(k, &kv)| data[reflect(i + k as isize - radius, n)] * kv)
                .sum()
        })
        .collect()
}

/// Remove broad trends: `data - gaussian_filter(data, window)`.
pub fn high_pass_gaussian(data: &[f64], window: f64) -> Vec<f64> {
    let lowpass = gaussian_filter(data, window);
    data.iter().zip(lowpass).map(|(v, lp)| v - lp).collect()
}

/// Apply [`high_pass_gaussian`] independently to every row of a matrix.
pub fn high_pass_gaussian_rows(data: &Array2<f64>, window: f64) -> Array2<f64> {
    let mut result = data.clone();
    if window <= 0.0 {
        return result;
    }
    let filter_row = |mut row: ndarray::ArrayViewMut1<f64>| {
        let filtered = high_pass_gaussian(&row.to_vec(), window);
        for (dst, v) in row.iter_mut().zip(filtered) {
            *dst = v;
        }
    };
    if data.nrows() >= PARALLEL_FRAME_THRESHOLD {
        result
            .axis_iter_mut(Axis(0))
            .into_par_iter()
            .for_each(filter_row);
    } else {
        result.axis_iter_mut(Axis(0)).for_each(filter_row);
    }
    result
}

fn make_gaussian_kernel(sigma: f64) -> Vec<f64> {
    let radius = (sigma * GAUSSIAN_TRUNCATE).round().max(1.0) as usize;
    let s2 = 2.0 * sigma * sigma;
    let mut kernel: Vec<f64> = (0..=2 * radius)
        .map(|i| {
            let x = i as f64 - radius as f64;
            (-x * x / s2).exp()
        })
        .collect();
    let sum: f64 = kernel.iter().sum();
    for v in &mut kernel {
        *v /= sum;
    }
    kernel
}

/// Map an out-of-range index back into `[0, n)` by half-sample reflection.
fn reflect(mut i: isize, n: isize) -> usize {
    let period = 2 * n;
    i = i.rem_euclid(period);
    if i >= n {
        i = period - 1 - i;
    }
    i as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reflect_folds_both_edges() {
        assert_eq!(reflect(-1, 4), 0);
        assert_eq!(reflect(-2, 4), 1);
        assert_eq!(reflect(4, 4), 3);
        assert_eq!(reflect(5, 4), 2);
    }

    #[test]
    fn constant_signal_has_no_high_pass_residual() {
        let data = vec![2.5; 50];
        let hp = high_pass_gaussian(&data, 5.0);
        assert!(hp.iter().all(|v| v.abs() < 1e-12));
    }
}
