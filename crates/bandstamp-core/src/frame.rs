use std::path::Path;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::error::{Result, StampError};
use crate::io::fits::FitsReader;
use crate::io::fits_header::FitsHeader;
use crate::wcs::{normalize_ra, CoordinateMapper};

/// One band's full-size detector image.
#[derive(Clone, Debug)]
pub struct FrameImage {
    /// Band identifier, e.g. "r".
    pub band: String,
    /// Pixel data indexed `[[col, row]]`, shape = (NAXIS1, NAXIS2)
    pub data: Array2<f32>,
    /// Original header, used as the stamp header template.
    pub header: FitsHeader,
    pub mapper: CoordinateMapper,
}

impl FrameImage {
    pub fn new(band: &str, data: Array2<f32>, header: FitsHeader, mapper: CoordinateMapper) -> Self {
        Self {
            band: band.to_string(),
            data,
            header,
            mapper,
        }
    }

    /// Build a frame whose coordinate mapper is parsed from `header`.
    pub fn from_header(band: &str, data: Array2<f32>, header: FitsHeader) -> Result<Self> {
        let mapper = CoordinateMapper::from_header(&header)?;
        Ok(Self::new(band, data, header, mapper))
    }

    /// Load the primary image and coordinate system of a FITS frame.
    pub fn from_fits(band: &str, path: &Path) -> Result<Self> {
        let mut reader = FitsReader::open(path)?;
        let data = reader.read_image()?;
        Self::from_header(band, data, reader.header)
    }

    pub fn cols(&self) -> usize {
        self.data.dim().0
    }

    pub fn rows(&self) -> usize {
        self.data.dim().1
    }
}

/// Sky position of the object of interest, in degrees.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TargetPosition {
    pub ra: f64,
    pub dec: f64,
}

impl TargetPosition {
    /// Validate and normalize ra into [0, 360).
    pub fn new(ra: f64, dec: f64) -> Result<Self> {
        if !ra.is_finite() || !dec.is_finite() || !(-90.0..=90.0).contains(&dec) {
            return Err(StampError::InvalidTarget { ra, dec });
        }
        Ok(Self {
            ra: normalize_ra(ra),
            dec,
        })
    }
}

/// Pixel-space displacement of a sky position between two grids,
/// measured in the moving band's pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PixelShift {
    pub dcol: f64,
    pub drow: f64,
}

impl PixelShift {
    pub fn new(dcol: f64, drow: f64) -> Self {
        Self { dcol, drow }
    }

    pub fn zero() -> Self {
        Self::default()
    }

    pub fn is_zero(&self) -> bool {
        self.dcol == 0.0 && self.drow == 0.0
    }

    pub fn magnitude(&self) -> f64 {
        self.dcol.hypot(self.drow)
    }
}
