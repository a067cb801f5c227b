pub mod config;
mod orchestrator;
mod types;

pub use orchestrator::{run_detection, run_detection_reported};
pub use types::{DetectionOutput, PipelineStage, ProgressReporter};
