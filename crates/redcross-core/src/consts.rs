/// Speed of light in km/s, as used by the Doppler factor `beta = 1 - v/c`.
pub const SPEED_OF_LIGHT_KMS: f64 = 2.998e5;

/// Minimum frame count to use frame-level Rayon parallelism.
pub const PARALLEL_FRAME_THRESHOLD: usize = 4;

/// Minimum number of valid samples needed to build a cubic spline.
pub const MIN_SPLINE_POINTS: usize = 4;

/// Relative tolerance on the spacing of a trial-velocity grid.
pub const GRID_UNIFORMITY_TOLERANCE: f64 = 1e-6;

/// Slack, in grid steps, when counting Kp-Vsys grid points from a range.
pub const GRID_EPSILON: f64 = 1e-9;

/// Default fractional edge margin when cropping the template to the data range.
pub const DEFAULT_CROP_EPS: f64 = 0.40;

/// Default sigma threshold for clipping outliers before frame alignment.
pub const DEFAULT_CLIP_SIGMA: f64 = 3.0;

/// Default half-width of the Kp grid around the nominal Kp (km/s).
pub const DEFAULT_KP_RADIUS: f64 = 50.0;

/// Default half-width of the Vrest grid (km/s).
pub const DEFAULT_VREST_MAX: f64 = 80.0;

/// Background threshold as a fraction of `vrest_max` when none is given.
pub const DEFAULT_BKG_FRACTION: f64 = 0.60;

/// Peak search half-window in Kp around the grid mean (km/s).
pub const PEAK_KP_WINDOW: f64 = 10.0;

/// Peak search half-window in Vrest around zero (km/s).
pub const PEAK_VREST_WINDOW: f64 = 5.0;

/// Percentile of |rv| above which CCF columns count as background.
pub const CCF_BKG_PERCENTILE: f64 = 40.0;

/// Percentile of |rv| below which columns are kept in the planet rest frame.
pub const PLANET_FRAME_PERCENTILE: f64 = 50.0;

/// Gaussian kernel truncation, in units of sigma.
pub const GAUSSIAN_TRUNCATE: f64 = 4.0;

/// Maximum Levenberg-Marquardt iterations for slice fits.
pub const FIT_MAX_ITERATIONS: usize = 200;

/// Relative change in chi-square below which a slice fit is converged.
pub const FIT_TOLERANCE: f64 = 1e-10;

/// Lower bound on the slice-fit offset parameter.
pub const FIT_OFFSET_LOWER_BOUND: f64 = -10.0;
