pub mod align;
pub mod ccf;
pub mod consts;
pub mod ephemeris;
pub mod error;
pub mod filters;
pub mod grid;
pub mod interp;
pub mod kpv;
pub mod parallel;
pub mod pipeline;
pub mod spectrum;
pub mod stats;
