use thiserror::Error;

#[derive(Error, Debug)]
pub enum RedcrossError {
    #[error("Degenerate input: {0}")]
    DegenerateInput(String),

    #[error("Grid mismatch: {0}")]
    GridMismatch(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Gaussian fit did not converge: {0}")]
    FitConvergence(String),

    #[error("Shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: String, actual: String },

    #[error("Empty frame sequence")]
    EmptySequence,

    #[error("Worker pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

pub type Result<T> = std::result::Result<T, RedcrossError>;
