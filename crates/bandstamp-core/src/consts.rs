/// Minimum pixel count (cols*rows) to use line-level Rayon parallelism.
pub const PARALLEL_PIXEL_THRESHOLD: usize = 65_536;

/// Pole of the cubic B-spline interpolation prefilter: sqrt(3) - 2.
pub const CUBIC_SPLINE_POLE: f64 = -0.267_949_192_431_122_7;

/// Truncation tolerance for the causal initialization of the spline prefilter.
pub const SPLINE_PREFILTER_TOLERANCE: f64 = 1e-15;

/// Tolerance when checking that stamp boundaries land on integer pixels.
pub const BOUNDARY_TOLERANCE: f64 = 1e-9;

/// Default stamp width and height in pixels.
pub const DEFAULT_STAMP_SIZE: usize = 64;

/// Default reference band (SDSS r).
pub const DEFAULT_REFERENCE_BAND: &str = "r";

/// Default band set (SDSS ugriz).
pub const DEFAULT_BANDS: [&str; 5] = ["u", "g", "r", "i", "z"];

/// Default native longitude of the celestial pole for zenithal projections.
pub const DEFAULT_LONPOLE: f64 = 180.0;

/// FITS logical record size in bytes.
pub const FITS_BLOCK_SIZE: usize = 2880;

/// FITS header card size in bytes.
pub const FITS_CARD_SIZE: usize = 80;

/// Filename prefix of per-band full frames inside an object directory.
pub const FRAME_FILE_PREFIX: &str = "frame-";

/// Filename prefix of per-band stamps inside an object directory.
pub const STAMP_FILE_PREFIX: &str = "stamp-";

/// Residual registration offset (pixels) above which a band is reported.
pub const REGISTRATION_WARN_PIXELS: f64 = 0.5;
