mod common;

use ndarray::{Array1, Array2};

use redcross_core::error::RedcrossError;
use redcross_core::kpv::{fit_gaussian, FitBounds, KpvMap, PeakQuery, SliceAxis};

use common::{gaussian, noise_map};

fn kp_axis() -> Array1<f64> {
    Array1::from_iter((0..100).map(|i| 50.0 + i as f64))
}

fn vrest_axis() -> Array1<f64> {
    Array1::from_iter((0..161).map(|i| -80.0 + i as f64))
}

fn index_of(axis: &Array1<f64>, value: f64) -> usize {
    axis.iter().position(|v| *v == value).unwrap()
}

/// Noise map with a Gaussian bump at `(kp, vrest)`.
fn bump_map(kp: f64, vrest: f64, amplitude: f64, seed: u64) -> Array2<f64> {
    let (kp_vec, vrest_vec) = (kp_axis(), vrest_axis());
    let mut values = noise_map(kp_vec.len(), vrest_vec.len(), 0.5, seed);
    for (i, &k) in kp_vec.iter().enumerate() {
        for (j, &v) in vrest_vec.iter().enumerate() {
            values[[i, j]] += amplitude * gaussian(k, kp, 8.0) * gaussian(v, vrest, 4.0);
        }
    }
    values
}

// ---------------------------------------------------------------------------
// Peak search
// ---------------------------------------------------------------------------

#[test]
fn test_window_excludes_larger_spurious_peak() {
    let (kp, vrest) = (kp_axis(), vrest_axis());
    let mut values = noise_map(kp.len(), vrest.len(), 1.0, 21);
    values[[index_of(&kp, 100.0), index_of(&vrest, 0.0)]] = 10.0;
    values[[index_of(&kp, 55.0), index_of(&vrest, 30.0)]] = 50.0;
    let mut map = KpvMap::new(kp, vrest, values, 48.0).unwrap();

    let peak = map.locate_peak(PeakQuery::Auto).unwrap();
    assert_eq!((peak.kp, peak.vrest), (100.0, 0.0));

    let global = map.snr_max().unwrap();
    assert_eq!((global.kp, global.vrest), (55.0, 30.0));
    assert!(global.snr > peak.snr);
}

#[test]
fn test_fixed_kp_searches_vrest_window_only() {
    let (kp, vrest) = (kp_axis(), vrest_axis());
    let mut values = noise_map(kp.len(), vrest.len(), 1.0, 22);
    let row = index_of(&kp, 60.0);
    values[[row, index_of(&vrest, -3.0)]] = 8.0;
    values[[row, index_of(&vrest, 20.0)]] = 30.0;
    let mut map = KpvMap::new(kp, vrest, values, 48.0).unwrap();

    let peak = map.locate_peak(PeakQuery::Kp(60.2)).unwrap();
    assert_eq!((peak.kp, peak.vrest), (60.0, -3.0));
}

#[test]
fn test_explicit_position_snaps_to_grid() {
    let mut map = KpvMap::new(kp_axis(), vrest_axis(), noise_map(100, 161, 1.0, 23), 48.0).unwrap();
    let peak = map.locate_peak(PeakQuery::Position { vrest: 29.6, kp: 55.2 }).unwrap();
    assert_eq!((peak.kp, peak.vrest), (55.0, 30.0));
    assert_eq!((peak.kp_index, peak.vrest_index), (5, 110));
    assert_eq!(map.value_at(29.6, 55.2).unwrap(), map.ccf_map()[[5, 110]]);
}

// ---------------------------------------------------------------------------
// Slices and fits
// ---------------------------------------------------------------------------

#[test]
fn test_gaussian_fit_recovers_parameters() {
    let x: Vec<f64> = (0..81).map(|i| -20.0 + 0.5 * i as f64).collect();
    let y: Vec<f64> = x.iter().map(|&v| 0.1 + 3.0 * gaussian(v, 1.5, 2.0)).collect();
    let bounds = FitBounds {
        lower: [0.0, -20.0, f64::EPSILON, -10.0],
        upper: [f64::INFINITY, 20.0, f64::INFINITY, f64::INFINITY],
    };
    let fit = fit_gaussian(&x, &y, &bounds).unwrap();
    assert!((fit.amplitude - 3.0).abs() < 1e-4);
    assert!((fit.center - 1.5).abs() < 1e-4);
    assert!((fit.sigma - 2.0).abs() < 1e-4);
    assert!((fit.offset - 0.1).abs() < 1e-4);
    assert!((fit.fwhm() - 4.709640).abs() < 1e-3);
}

#[test]
fn test_gaussian_fit_rejects_missing_samples() {
    let x = [0.0, 1.0, 2.0, 3.0, 4.0];
    let y = [0.0, 1.0, f64::NAN, 1.0, 0.0];
    let bounds = FitBounds {
        lower: [0.0, 0.0, f64::EPSILON, -10.0],
        upper: [f64::INFINITY, 4.0, f64::INFINITY, f64::INFINITY],
    };
    assert!(matches!(
        fit_gaussian(&x, &y, &bounds),
        Err(RedcrossError::FitConvergence(_))
    ));
}

#[test]
fn test_slices_pass_through_peak() {
    let mut map = KpvMap::new(kp_axis(), vrest_axis(), bump_map(100.0, 0.0, 20.0, 31), 48.0).unwrap();
    let peak = map.locate_peak(PeakQuery::Auto).unwrap();
    let snr = map.snr().unwrap();

    let horizontal = map.slice(SliceAxis::Horizontal, &peak, false).unwrap();
    assert_eq!(horizontal.x, vrest_axis());
    assert_eq!(horizontal.y, snr.row(peak.kp_index));
    assert!(horizontal.fit.is_none());

    let vertical = map.slice(SliceAxis::Vertical, &peak, false).unwrap();
    assert_eq!(vertical.x, kp_axis());
    assert_eq!(vertical.y, snr.column(peak.vrest_index));
}

#[test]
fn test_fit_peak_reports_both_slices() {
    let mut map = KpvMap::new(kp_axis(), vrest_axis(), bump_map(100.0, 0.0, 20.0, 32), 48.0).unwrap();
    let report = map.fit_peak().unwrap();

    assert_eq!(map.peak(), Some(&report.peak));
    let vrest_fit = report.vrest_fit().unwrap();
    let kp_fit = report.kp_fit().unwrap();
    assert!(vrest_fit.center.abs() < 1.0, "Vrest centre {}", vrest_fit.center);
    assert!((kp_fit.center - 100.0).abs() < 1.5, "Kp centre {}", kp_fit.center);
    assert!((vrest_fit.sigma - 4.0).abs() < 1.0);
}

#[test]
fn test_failed_slice_fit_is_recoverable() {
    let mut values = bump_map(100.0, 0.0, 20.0, 33);
    values[[index_of(&kp_axis(), 100.0), index_of(&vrest_axis(), 10.0)]] = f64::NAN;
    let mut map = KpvMap::new(kp_axis(), vrest_axis(), values, 48.0).unwrap();

    map.locate_peak(PeakQuery::Position { vrest: 0.0, kp: 100.0 }).unwrap();
    let report = map.fit_peak().unwrap();

    assert!(matches!(
        report.horizontal.fit,
        Some(Err(RedcrossError::FitConvergence(_)))
    ));
    assert!(report.vrest_fit().is_none());
    let kp_fit = report.kp_fit().unwrap();
    assert!((kp_fit.center - 100.0).abs() < 1.5);
}
