use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use ndarray::Array1;
use rand::rngs::StdRng;
use rand::SeedableRng;
use redcross_core::ephemeris::{CircularOrbit, PlanetEphemeris};
use redcross_core::pipeline::config::AnalysisConfig;
use redcross_core::pipeline::{run_detection_reported, PipelineStage, ProgressReporter};
use redcross_core::spectrum::RestFrame;
use tracing::info;

use crate::summary::{print_detection_summary, print_simulation_summary};
use crate::synthetic::{observe, LineList};

const TEMPLATE_RANGE: (f64, f64) = (1000.0, 1100.0);
const ORDERS: [(f64, f64); 3] = [(1010.0, 1035.0), (1040.0, 1065.0), (1070.0, 1090.0)];

#[derive(Args)]
pub struct SimulateArgs {
    /// Analysis config file (TOML); defaults are used when omitted
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Nominal Kp of the ephemeris, the centre of the Kp grid (km/s)
    #[arg(long, default_value = "100")]
    pub kp: f64,

    /// Kp of the injected signal (km/s); defaults to the nominal Kp
    #[arg(long)]
    pub kp_true: Option<f64>,

    /// Rest-frame velocity offset of the injected signal (km/s)
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    pub vrest: f64,

    /// Number of frames
    #[arg(long, default_value = "40")]
    pub frames: usize,

    /// Orbital phase of the first frame
    #[arg(long, default_value = "0.38")]
    pub phase_start: f64,

    /// Orbital phase of the last frame
    #[arg(long, default_value = "0.62")]
    pub phase_end: f64,

    /// Depth scale of the planet lines relative to the template
    #[arg(long, default_value = "0.05")]
    pub strength: f64,

    /// Per-pixel white noise (continuum units)
    #[arg(long, default_value = "0.02")]
    pub noise: f64,

    /// Number of template lines
    #[arg(long, default_value = "60")]
    pub lines: usize,

    /// Random seed
    #[arg(long, default_value = "1")]
    pub seed: u64,
}

/// Progress bar advanced once per pipeline stage work item.
struct StageProgress {
    pb: ProgressBar,
}

impl ProgressReporter for StageProgress {
    fn begin_stage(&self, stage: PipelineStage, total_items: Option<usize>) {
        self.pb.set_length(total_items.unwrap_or(1) as u64);
        self.pb.set_position(0);
        self.pb.set_message(stage.to_string());
    }

    fn advance(&self, items_done: usize) {
        self.pb.set_position(items_done as u64);
    }

    fn finish_stage(&self) {
        if let Some(len) = self.pb.length() {
            self.pb.set_position(len);
        }
    }
}

pub fn run(args: &SimulateArgs) -> Result<()> {
    if args.frames < 2 {
        bail!("Need at least 2 frames, got {}", args.frames);
    }
    let config: AnalysisConfig = if let Some(ref config_path) = args.config {
        let contents = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config {}", config_path.display()))?;
        toml::from_str(&contents).context("Invalid analysis config")?
    } else {
        AnalysisConfig::default()
    };

    let phase = Array1::linspace(args.phase_start, args.phase_end, args.frames);
    let orbit = CircularOrbit::new(args.kp, phase).with_eclipse_half_width(0.04);
    let kp_true = args.kp_true.unwrap_or(args.kp);
    let rv = orbit.radial_velocity(kp_true, RestFrame::Stellar) + args.vrest;

    let mut rng = StdRng::seed_from_u64(args.seed);
    let lines = LineList::random(args.lines, TEMPLATE_RANGE, &mut rng);
    let template = lines.template(TEMPLATE_RANGE)?;
    let orders = observe(&lines, &ORDERS, &rv, args.strength, args.noise, &mut rng)?;
    info!(
        orders = orders.len(),
        frames = args.frames,
        lines = args.lines,
        seed = args.seed,
        "Synthetic observations generated"
    );

    print_simulation_summary(args, kp_true, &config);

    let pb = ProgressBar::new(1);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg:24} [{bar:40}] {pos}/{len}")?
            .progress_chars("=> "),
    );
    let reporter = StageProgress { pb };
    let output = run_detection_reported(&orders, &template, &orbit, &config, &reporter)?;
    reporter.pb.finish_with_message("Done");

    print_detection_summary(&output, kp_true, args.vrest);
    Ok(())
}
