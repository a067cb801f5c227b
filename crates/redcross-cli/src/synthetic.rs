//! Synthetic observations: an absorption-line template and a planet signal
//! Doppler-shifted along a circular orbit.

use anyhow::Result;
use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::Rng;
use rand_distr::{Distribution, Normal};
use redcross_core::consts::SPEED_OF_LIGHT_KMS;
use redcross_core::spectrum::{RestFrame, SpectralSeries, Template};

const LINE_SIGMA_NM: f64 = 0.02;
const TEMPLATE_STEP_NM: f64 = 0.005;
const DATA_STEP_NM: f64 = 0.02;

/// Randomly placed Gaussian absorption lines over a wavelength range.
pub struct LineList {
    centers: Vec<f64>,
    depths: Vec<f64>,
}

impl LineList {
    pub fn random(n_lines: usize, range: (f64, f64), rng: &mut StdRng) -> Self {
        let (lo, hi) = range;
        let mut centers: Vec<f64> = (0..n_lines).map(|_| rng.random_range(lo..hi)).collect();
        centers.sort_by(|a, b| a.total_cmp(b));
        let depths = (0..n_lines).map(|_| rng.random_range(0.1..0.7)).collect();
        Self { centers, depths }
    }

    pub fn flux(&self, w: f64) -> f64 {
        let s2 = 2.0 * LINE_SIGMA_NM * LINE_SIGMA_NM;
        self.centers
            .iter()
            .zip(&self.depths)
            .fold(1.0, |f, (c, d)| f - d * (-(w - c) * (w - c) / s2).exp())
    }

    pub fn template(&self, range: (f64, f64)) -> Result<Template> {
        let wave = sample_axis(range, TEMPLATE_STEP_NM);
        let flux = wave.mapv(|w| self.flux(w));
        Ok(Template::new(wave, flux)?)
    }
}

fn sample_axis((lo, hi): (f64, f64), step: f64) -> Array1<f64> {
    let n = ((hi - lo) / step).round() as usize + 1;
    Array1::from_iter((0..n).map(|i| lo + i as f64 * step))
}

/// Stellar-frame orders where frame `i` carries the lines shifted by `rv[i]`,
/// scaled by `strength`, on top of white noise.
pub fn observe(
    lines: &LineList,
    orders: &[(f64, f64)],
    rv: &Array1<f64>,
    strength: f64,
    noise: f64,
    rng: &mut StdRng,
) -> Result<Vec<SpectralSeries>> {
    let normal = Normal::new(0.0, noise)?;
    orders
        .iter()
        .map(|&range| {
            let wave = sample_axis(range, DATA_STEP_NM);
            let mut flux = Array2::<f64>::zeros((rv.len(), wave.len()));
            for (i, &v) in rv.iter().enumerate() {
                let beta = 1.0 - v / SPEED_OF_LIGHT_KMS;
                for (p, &w) in wave.iter().enumerate() {
                    let line = lines.flux(w * beta) - 1.0;
                    flux[[i, p]] = 1.0 + strength * line + normal.sample(rng);
                }
            }
            Ok(SpectralSeries::new(flux, wave)?.with_frame(RestFrame::Stellar))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn same_seed_gives_same_observation() {
        let build = || {
            let mut rng = StdRng::seed_from_u64(7);
            let lines = LineList::random(10, (1010.0, 1030.0), &mut rng);
            let rv = Array1::from_vec(vec![-20.0, 0.0, 20.0]);
            observe(&lines, &[(1015.0, 1025.0)], &rv, 0.1, 0.01, &mut rng).unwrap()
        };
        let (a, b) = (build(), build());
        assert_eq!(a.len(), 1);
        assert_eq!(a[0].flux(), b[0].flux());
        assert_eq!(a[0].frame, RestFrame::Stellar);
    }

    #[test]
    fn lines_stay_inside_range() {
        let mut rng = StdRng::seed_from_u64(3);
        let lines = LineList::random(50, (1000.0, 1010.0), &mut rng);
        assert!(lines.centers.iter().all(|c| (1000.0..1010.0).contains(c)));
        assert!(lines.centers.windows(2).all(|w| w[0] <= w[1]));
    }
}
