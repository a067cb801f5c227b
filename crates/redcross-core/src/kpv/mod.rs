//! Kp-Vsys re-projection, significance mapping and peak characterization.

pub mod fit;
mod map;
mod mapper;
mod peak;

pub use fit::{fit_gaussian, FitBounds, GaussianFit};
pub use map::KpvMap;
pub use mapper::KpvMapper;
pub use peak::{PeakDescriptor, PeakQuery, PeakReport, Slice, SliceAxis};
