use ndarray::{Array1, Array2};

use redcross_core::align::{correlation_coefficient, shift_curve, sigma_clip, FrameAligner};
use redcross_core::error::RedcrossError;
use redcross_core::grid::VelocityGrid;
use redcross_core::interp::InterpolationMode;
use redcross_core::pipeline::config::AlignConfig;
use redcross_core::spectrum::SpectralSeries;

const N_PIX: usize = 500;

/// Windowed two-tone signal, flat at 1.0 outside pixels 50..450.
fn base(p: f64) -> f64 {
    let window = if (50.0..=450.0).contains(&p) {
        (std::f64::consts::PI * (p - 50.0) / 400.0).sin().powi(2)
    } else {
        0.0
    };
    let tau = std::f64::consts::TAU;
    1.0 + window * (0.1 * (tau * p / 37.0).sin() + 0.05 * (tau * p / 11.0).sin())
}

/// Frame `j` is the base signal moved right by `shifts[j]` pixels.
fn shifted_series(shifts: &[f64]) -> SpectralSeries {
    let flux = Array2::from_shape_fn((shifts.len(), N_PIX), |(j, p)| base(p as f64 - shifts[j]));
    let wave = Array1::from_iter((0..N_PIX).map(|p| 1000.0 + p as f64 * 0.01));
    SpectralSeries::new(flux, wave).unwrap()
}

fn aligner() -> FrameAligner {
    FrameAligner::new(AlignConfig {
        clip_sigma: 5.0,
        ..AlignConfig::default()
    })
    .unwrap()
}

#[test]
fn test_correlation_coefficient_of_identical_signals_is_one() {
    let f = [1.0, 3.0, 2.0, 5.0];
    assert!((correlation_coefficient(&f, &f) - 1.0).abs() < 1e-12);
    assert_eq!(correlation_coefficient(&f, &[0.0; 4]), 0.0);
}

#[test]
fn test_sigma_clip_masks_outlier() {
    let mut values = vec![0.0; 9];
    values.push(100.0);
    let clipped = sigma_clip(&values, 2.0);
    assert!(clipped[9].is_nan());
    assert!(clipped[..9].iter().all(|v| *v == 0.0));
}

#[test]
fn test_measured_shifts_match_injected() {
    let injected = [0.0, 0.5, -1.2, 2.3, -2.7, 1.0];
    let series = shifted_series(&injected);
    let result = aligner().run(&series).unwrap();

    assert_eq!(result.ccf.dim(), (injected.len(), result.grid.len()));
    assert_eq!(result.shifts[0], 0.0);
    for (j, &d) in injected.iter().enumerate().skip(1) {
        assert!(
            (result.shifts[j] - d).abs() < 0.06,
            "frame {j}: measured {} for injected {d}",
            result.shifts[j]
        );
    }
}

#[test]
fn test_applied_shifts_restore_reference() {
    let series = shifted_series(&[0.0, 1.5, -2.0, 0.7]);
    let (corrected, result) = aligner().align(&series).unwrap();

    assert_eq!(corrected.flux().row(0), series.flux().row(0));
    for j in 1..corrected.n_obs() {
        assert!(result.shifts[j] != 0.0);
        for p in 20..N_PIX - 20 {
            let diff = (corrected.flux()[[j, p]] - base(p as f64)).abs();
            assert!(diff < 1e-3, "frame {j} pixel {p} off by {diff}");
        }
    }
}

#[test]
fn test_outlier_spike_does_not_move_shift() {
    let mut series = shifted_series(&[0.0, 1.8]);
    let mut flux = series.flux().clone();
    flux[[1, 250]] += 5.0;
    series = series.with_flux(flux).unwrap();

    let result = aligner().run(&series).unwrap();
    assert!((result.shifts[1] - 1.8).abs() < 0.06);
}

#[test]
fn test_linear_interpolation_also_recovers_integer_shift() {
    let series = shifted_series(&[0.0, 3.0]);
    let config = AlignConfig {
        clip_sigma: 5.0,
        interpolation: InterpolationMode::Linear,
        ..AlignConfig::default()
    };
    let result = FrameAligner::new(config).unwrap().run(&series).unwrap();
    assert!((result.shifts[1] - 3.0).abs() < 0.06);
}

#[test]
fn test_too_few_valid_pixels_is_degenerate() {
    let reference: Vec<f64> = (0..10).map(|i| i as f64).collect();
    let mut target = reference.clone();
    for v in target.iter_mut().skip(3) {
        *v = f64::NAN;
    }
    let grid = VelocityGrid::arange(-1.0, 1.1, 0.1).unwrap();
    let result = shift_curve(&reference, &target, &grid, 3.0, InterpolationMode::Spline);
    assert!(matches!(result, Err(RedcrossError::DegenerateInput(_))));
}

#[test]
fn test_shift_count_must_match_frames() {
    let series = shifted_series(&[0.0, 1.0]);
    let result = aligner().apply_shifts(&series, &Array1::zeros(3));
    assert!(matches!(result, Err(RedcrossError::GridMismatch(_))));
}
