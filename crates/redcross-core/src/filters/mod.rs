pub mod gaussian;

pub use gaussian::{gaussian_filter, high_pass_gaussian, high_pass_gaussian_rows};
