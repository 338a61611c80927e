use thiserror::Error;

#[derive(Error, Debug)]
pub enum StampError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("FITS error: {0}")]
    Fits(#[from] fitsio::errors::Error),

    #[error("Invalid FITS file: {0}")]
    InvalidFits(String),

    #[error("Invalid coordinate system: {0}")]
    InvalidCoordinateSystem(String),

    #[error("Stamp width and height have different parity: {width}x{height}")]
    ParityMismatch { width: usize, height: usize },

    #[error("Stamp boundaries are not integers: x=[{x0}, {x1}) y=[{y0}, {y1})")]
    NonIntegerBoundary { x0: f64, x1: f64, y0: f64, y1: f64 },

    #[error(
        "Stamp x=[{x0}, {x1}) y=[{y0}, {y1}) exceeds source image ({cols}x{rows})"
    )]
    OutOfBounds {
        x0: i64,
        x1: i64,
        y0: i64,
        y1: i64,
        cols: usize,
        rows: usize,
    },

    #[error("Band '{0}' is not part of the band set")]
    UnknownBand(String),

    #[error("Band '{0}' appears more than once")]
    DuplicateBand(String),

    #[error("Empty band set")]
    EmptyBandSet,

    #[error("Invalid target position: ra={ra}, dec={dec}")]
    InvalidTarget { ra: f64, dec: f64 },

    #[error("Array shape mismatch: {a_cols}x{a_rows} vs {b_cols}x{b_rows}")]
    ShapeMismatch {
        a_cols: usize,
        a_rows: usize,
        b_cols: usize,
        b_rows: usize,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, StampError>;
