//! Doppler cross-correlation of spectral series against a template.

mod engine;
mod map;
pub mod projector;

pub use engine::CrossCorrelator;
pub use map::CcfMap;
pub use projector::{doppler_factors, DopplerProjector};
