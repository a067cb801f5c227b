use crate::align::AlignmentResult;
use crate::ccf::CcfMap;
use crate::kpv::{KpvMap, PeakReport};

/// Pipeline processing stage, used for progress reporting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineStage {
    Alignment,
    CrossCorrelation,
    KpVsys,
    PeakAnalysis,
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Alignment => write!(f, "Aligning frames"),
            Self::CrossCorrelation => write!(f, "Cross-correlating"),
            Self::KpVsys => write!(f, "Building Kp-Vsys map"),
            Self::PeakAnalysis => write!(f, "Characterizing peak"),
        }
    }
}

/// Everything produced by one detection run.
#[derive(Debug)]
pub struct DetectionOutput {
    /// One entry per order when alignment was configured.
    pub alignment: Option<Vec<AlignmentResult>>,
    pub ccf: CcfMap,
    pub kpv: KpvMap,
    pub report: PeakReport,
}

/// Thread-safe progress reporting for the pipeline.
///
/// All methods have default no-op implementations.
pub trait ProgressReporter: Send + Sync {
    /// A new pipeline stage has started. `total_items` is the number of
    /// work items in this stage (e.g., order count), if known.
    fn begin_stage(&self, _stage: PipelineStage, _total_items: Option<usize>) {}

    /// One work item within the current stage has completed.
    fn advance(&self, _items_done: usize) {}

    /// The current stage is finished.
    fn finish_stage(&self) {}
}

/// No-op progress reporter, used when `run_detection` delegates.
pub(super) struct NoOpReporter;
impl ProgressReporter for NoOpReporter {}
