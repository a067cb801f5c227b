#![allow(dead_code)]

use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

use redcross_core::ccf::CcfMap;
use redcross_core::consts::SPEED_OF_LIGHT_KMS;
use redcross_core::ephemeris::CircularOrbit;
use redcross_core::grid::VelocityGrid;
use redcross_core::spectrum::{RestFrame, SpectralSeries, Template};

/// Width (nm) of every synthetic absorption line.
pub const LINE_SIGMA: f64 = 0.02;

/// Evenly spaced samples `start, start + step, ...` up to and including `stop`.
pub fn linspace_step(start: f64, stop: f64, step: f64) -> Array1<f64> {
    let n = ((stop - start) / step).round() as usize + 1;
    Array1::from_iter((0..n).map(|i| start + i as f64 * step))
}

/// `n` phases evenly spread over `[first, last]`.
pub fn phases(first: f64, last: f64, n: usize) -> Array1<f64> {
    Array1::from_iter((0..n).map(|i| first + (last - first) * i as f64 / (n - 1) as f64))
}

/// Continuum-normalized absorption spectrum with 40 lines between 1002 and 1098 nm.
pub fn line_flux(w: f64) -> f64 {
    let mut flux = 1.0;
    for i in 0..40 {
        let center = 1002.0 + 2.4 * i as f64 + 0.37 * ((i * 5) % 7) as f64;
        let depth = 0.2 + 0.05 * ((i * 3) % 10) as f64;
        let d = w - center;
        flux -= depth * (-d * d / (2.0 * LINE_SIGMA * LINE_SIGMA)).exp();
    }
    flux
}

/// [`line_flux`] sampled every 0.005 nm over 1000-1100 nm.
pub fn line_template() -> Template {
    let wave = linspace_step(1000.0, 1100.0, 0.005);
    let flux = wave.mapv(line_flux);
    Template::new(wave, flux).unwrap()
}

/// Data wavelength axis, 0.01 nm sampling over 1020-1080 nm.
pub fn data_wave() -> Array1<f64> {
    linspace_step(1020.0, 1080.0, 0.01)
}

/// [`line_flux`] Doppler-shifted by `rv` km/s, sampled on `wave`.
pub fn shifted_flux(wave: &Array1<f64>, rv: f64) -> Array1<f64> {
    let beta = 1.0 - rv / SPEED_OF_LIGHT_KMS;
    wave.mapv(|w| line_flux(w * beta))
}

/// One frame per radial velocity, with optional white noise.
pub fn series_with_shifts(
    wave: &Array1<f64>,
    rvs: &[f64],
    noise_sigma: f64,
    seed: u64,
) -> SpectralSeries {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut flux = Array2::<f64>::zeros((rvs.len(), wave.len()));
    for (i, &rv) in rvs.iter().enumerate() {
        flux.row_mut(i).assign(&shifted_flux(wave, rv));
    }
    if noise_sigma > 0.0 {
        let normal = Normal::new(0.0, noise_sigma).unwrap();
        flux.mapv_inplace(|v| v + normal.sample(&mut rng));
    }
    SpectralSeries::new(flux, wave.clone()).unwrap()
}

/// Stellar-frame orders carrying a planet signal at `(kp, vrest)` for each phase.
pub fn planet_orders(
    kp: f64,
    vrest: f64,
    phase: &Array1<f64>,
    noise_sigma: f64,
    seed: u64,
) -> Vec<SpectralSeries> {
    let rvs: Vec<f64> = phase
        .iter()
        .map(|p| vrest + kp * (std::f64::consts::TAU * p).sin())
        .collect();
    [(1010.0, 1050.0), (1050.0, 1090.0)]
        .iter()
        .enumerate()
        .map(|(o, &(lo, hi))| {
            let wave = linspace_step(lo, hi, 0.02);
            series_with_shifts(&wave, &rvs, noise_sigma, seed + o as u64)
                .with_frame(RestFrame::Stellar)
        })
        .collect()
}

/// Orbit centred on Kp = 100 km/s with a 0.04 phase-wide eclipse half-width.
pub fn test_orbit(phase: Array1<f64>) -> CircularOrbit {
    CircularOrbit::new(100.0, phase).with_eclipse_half_width(0.04)
}

pub fn gaussian(x: f64, center: f64, sigma: f64) -> f64 {
    let d = x - center;
    (-d * d / (2.0 * sigma * sigma)).exp()
}

/// Stellar-frame CCF map whose rows are Gaussians (sigma 3 km/s) at
/// `vrest + kp * sin(2 pi phase)`, on a -250..250 km/s grid.
pub fn injected_ccf(
    kp: f64,
    vrest: f64,
    phase: &Array1<f64>,
    noise_sigma: f64,
    seed: u64,
) -> CcfMap {
    let rv = VelocityGrid::arange(-250.0, 251.0, 1.0).unwrap();
    let mut rng = StdRng::seed_from_u64(seed);
    let normal = Normal::new(0.0, noise_sigma.max(f64::MIN_POSITIVE)).unwrap();
    let mut values = Array2::<f64>::zeros((phase.len(), rv.len()));
    for (i, &p) in phase.iter().enumerate() {
        let center = vrest + kp * (std::f64::consts::TAU * p).sin();
        for (k, &v) in rv.as_slice().iter().enumerate() {
            let noise = if noise_sigma > 0.0 { normal.sample(&mut rng) } else { 0.0 };
            values[[i, k]] = gaussian(v, center, 3.0) + noise;
        }
    }
    CcfMap::new(rv, values, RestFrame::Stellar).unwrap()
}

/// Map of standard-normal noise of the given shape.
pub fn noise_map(rows: usize, cols: usize, sigma: f64, seed: u64) -> Array2<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let normal = Normal::new(0.0, sigma).unwrap();
    Array2::from_shape_fn((rows, cols), |_| normal.sample(&mut rng))
}
