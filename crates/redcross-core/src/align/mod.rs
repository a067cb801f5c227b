//! Pixel-shift estimation and correction for a series of spectra.

pub mod correlation;
mod dispatcher;

pub use correlation::{correlation_coefficient, shift_curve, sigma_clip};
pub use dispatcher::{AlignmentResult, FrameAligner};
