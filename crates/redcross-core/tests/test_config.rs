use redcross_core::interp::InterpolationMode;
use redcross_core::kpv::SliceAxis;
use redcross_core::pipeline::config::{AlignConfig, AnalysisConfig, CcfConfig, KpvConfig, NoiseMode};
use redcross_core::pipeline::PipelineStage;
use redcross_core::spectrum::RestFrame;

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

#[test]
fn test_noise_mode_display() {
    assert_eq!(format!("{}", NoiseMode::Var), "Variance");
    assert_eq!(format!("{}", NoiseMode::FluxErr), "Flux Error");
    assert_eq!(format!("{}", NoiseMode::Ones), "Uniform");
}

#[test]
fn test_rest_frame_display() {
    assert_eq!(format!("{}", RestFrame::Telluric), "telluric");
    assert_eq!(format!("{}", RestFrame::Planet), "planet");
}

#[test]
fn test_slice_axis_display() {
    assert_eq!(format!("{}", SliceAxis::Horizontal), "Vrest");
    assert_eq!(format!("{}", SliceAxis::Vertical), "Kp");
}

#[test]
fn test_pipeline_stage_display() {
    assert_eq!(format!("{}", PipelineStage::Alignment), "Aligning frames");
    assert_eq!(format!("{}", PipelineStage::CrossCorrelation), "Cross-correlating");
    assert_eq!(format!("{}", PipelineStage::KpVsys), "Building Kp-Vsys map");
    assert_eq!(format!("{}", PipelineStage::PeakAnalysis), "Characterizing peak");
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

#[test]
fn test_ccf_config_defaults() {
    let config = CcfConfig::default();
    assert_eq!(config.noise, NoiseMode::Var);
    assert_eq!(config.interpolation, InterpolationMode::Linear);
    assert_eq!(config.window, 0.0);
    assert_eq!(config.crop_eps, 0.40);
    assert_eq!(config.velocities.build().unwrap().len(), 401);
}

#[test]
fn test_kpv_config_defaults() {
    let config = KpvConfig::default();
    assert_eq!(config.kp_radius, 50.0);
    assert_eq!(config.vrest_max, 80.0);
    assert!(config.bkg.is_none());
    assert!(config.delta_rv.is_none());
    assert!(config.ignore_eclipse);
}

#[test]
fn test_align_config_defaults() {
    let config = AlignConfig::default();
    assert_eq!(config.interpolation, InterpolationMode::Spline);
    assert_eq!(config.clip_sigma, 3.0);
    let grid = config.shifts.build().unwrap();
    assert_eq!(grid.first(), -10.0);
    assert!((grid.last() - 10.1).abs() < 1e-9);
}

#[test]
fn test_analysis_config_skips_alignment_by_default() {
    assert!(AnalysisConfig::default().align.is_none());
}

// ---------------------------------------------------------------------------
// Serde
// ---------------------------------------------------------------------------

#[test]
fn test_analysis_config_json_round_trip() {
    let config = AnalysisConfig {
        align: Some(AlignConfig::default()),
        ccf: CcfConfig {
            noise: NoiseMode::FluxErr,
            window: 15.0,
            ..CcfConfig::default()
        },
        kpv: KpvConfig {
            bkg: Some(40.0),
            ..KpvConfig::default()
        },
    };
    let json = serde_json::to_string(&config).unwrap();
    let back: AnalysisConfig = serde_json::from_str(&json).unwrap();

    assert_eq!(back.ccf.noise, NoiseMode::FluxErr);
    assert_eq!(back.ccf.window, 15.0);
    assert_eq!(back.kpv.bkg, Some(40.0));
    assert_eq!(back.align.unwrap().shifts, config.align.unwrap().shifts);
}

#[test]
fn test_missing_sections_use_defaults() {
    let back: AnalysisConfig = serde_json::from_str("{\"align\": null}").unwrap();
    assert!(back.align.is_none());
    assert_eq!(back.kpv.vrest_max, 80.0);
    assert_eq!(back.ccf.crop_eps, 0.40);
}

#[test]
fn test_align_interpolation_defaults_to_spline_when_omitted() {
    let json = r#"{"shifts": {"start": -5.0, "stop": 5.1, "step": 0.1}, "clip_sigma": 4.0}"#;
    let config: AlignConfig = serde_json::from_str(json).unwrap();
    assert_eq!(config.interpolation, InterpolationMode::Spline);
    assert_eq!(config.parallelism, 0);
}
