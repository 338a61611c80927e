use std::ffi::CStr;
use std::os::raw::{c_char, c_int};
use std::path::Path;

use fitsio::hdu::HduInfo;
use fitsio::{sys, FitsFile};
use ndarray::Array2;

use crate::consts::{FITS_BLOCK_SIZE, FITS_CARD_SIZE};
use crate::error::{Result, StampError};

use super::fits_header::{Card, FitsHeader};

/// Sample encoding of the primary data unit, from `BITPIX`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Bitpix {
    U8,
    I16,
    I32,
    I64,
    F32,
    F64,
}

impl Bitpix {
    pub fn from_value(bitpix: i64) -> Result<Self> {
        match bitpix {
            8 => Ok(Self::U8),
            16 => Ok(Self::I16),
            32 => Ok(Self::I32),
            64 => Ok(Self::I64),
            -32 => Ok(Self::F32),
            -64 => Ok(Self::F64),
            other => Err(StampError::InvalidFits(format!("unsupported BITPIX {other}"))),
        }
    }

    pub fn value(self) -> i64 {
        match self {
            Self::U8 => 8,
            Self::I16 => 16,
            Self::I32 => 32,
            Self::I64 => 64,
            Self::F32 => -32,
            Self::F64 => -64,
        }
    }

    pub fn bytes_per_sample(self) -> usize {
        match self {
            Self::U8 => 1,
            Self::I16 => 2,
            Self::I32 | Self::F32 => 4,
            Self::I64 | Self::F64 => 8,
        }
    }
}

/// Reader for the primary HDU of a FITS file, backed by cfitsio.
///
/// Only two-dimensional primary images are supported; any extensions after
/// the primary data unit are ignored.
pub struct FitsReader {
    fptr: FitsFile,
    pub header: FitsHeader,
    bitpix: Bitpix,
    cols: usize,
    rows: usize,
}

impl FitsReader {
    /// Open a FITS file and read every primary header card.
    ///
    /// The declared data unit is checked against the file size here, so a
    /// header that overstates its image fails before any pixel is read.
    pub fn open(path: &Path) -> Result<Self> {
        let file_len = std::fs::metadata(path)?.len();

        let mut fptr = FitsFile::open(path)?;
        let hdu = fptr.primary_hdu()?;
        let shape = match &hdu.info {
            HduInfo::ImageInfo { shape, .. } => shape.clone(),
            HduInfo::TableInfo { .. } => {
                return Err(StampError::InvalidFits(
                    "primary HDU is a table, not an image".into(),
                ))
            }
            HduInfo::AnyInfo => {
                return Err(StampError::InvalidFits("unknown primary HDU type".into()))
            }
        };
        // Shape is reported slowest axis first: [NAXIS2, NAXIS1].
        let (rows, cols) = match shape[..] {
            [rows, cols] if rows > 0 && cols > 0 => (rows, cols),
            _ => {
                return Err(StampError::InvalidFits(format!(
                    "expected a 2-dimensional primary image, got shape {shape:?}"
                )))
            }
        };

        let header = read_header_cards(&mut fptr)?;
        // The literal BITPIX; cfitsio reports the scaled type in `image_type`.
        let bitpix = Bitpix::from_value(header.require_i64("BITPIX")?)?;

        let header_len = (header.len() + 1)
            .checked_mul(FITS_CARD_SIZE)
            .map(|n| n.div_ceil(FITS_BLOCK_SIZE) * FITS_BLOCK_SIZE);
        let data_end = cols
            .checked_mul(rows)
            .and_then(|n| n.checked_mul(bitpix.bytes_per_sample()))
            .zip(header_len)
            .and_then(|(data_len, header_len)| data_len.checked_add(header_len))
            .ok_or_else(|| StampError::InvalidFits("image dimensions overflow".into()))?;
        if file_len < data_end as u64 {
            return Err(StampError::InvalidFits(format!(
                "File truncated: expected at least {data_end} bytes, got {file_len}"
            )));
        }

        Ok(Self {
            fptr,
            header,
            bitpix,
            cols,
            rows,
        })
    }

    pub fn bitpix(&self) -> Bitpix {
        self.bitpix
    }

    /// Image dimensions as `(NAXIS1, NAXIS2)`.
    pub fn dimensions(&self) -> (usize, usize) {
        (self.cols, self.rows)
    }

    /// Decode the primary image into physical values indexed `[[col, row]]`.
    ///
    /// cfitsio applies `BSCALE` and `BZERO`.
    pub fn read_image(&mut self) -> Result<Array2<f32>> {
        let hdu = self.fptr.primary_hdu()?;
        let pixels: Vec<f32> = hdu.read_image(&mut self.fptr)?;
        // NAXIS1 varies fastest on disk.
        let plane = Array2::from_shape_vec((self.rows, self.cols), pixels).map_err(|e| {
            StampError::InvalidFits(format!("pixel count does not match NAXIS: {e}"))
        })?;
        Ok(plane.reversed_axes().as_standard_layout().into_owned())
    }
}

/// Read every keyword record of the current HDU, excluding `END`.
fn read_header_cards(fptr: &mut FitsFile) -> Result<FitsHeader> {
    let mut status: c_int = 0;
    let mut count: c_int = 0;
    let mut space: c_int = 0;
    unsafe {
        sys::ffghsp(fptr.as_raw(), &mut count, &mut space, &mut status);
    }
    check_status(status, "counting header records")?;

    let mut header = FitsHeader::new();
    let mut buffer = [0 as c_char; FITS_CARD_SIZE + 1];
    for n in 1..=count {
        unsafe {
            sys::ffgrec(fptr.as_raw(), n, buffer.as_mut_ptr(), &mut status);
        }
        check_status(status, "reading a header record")?;
        let record = unsafe { CStr::from_ptr(buffer.as_ptr()) };
        header.push(Card::parse(record.to_bytes())?);
    }
    Ok(header)
}

pub(super) fn check_status(status: c_int, action: &str) -> Result<()> {
    if status == 0 {
        Ok(())
    } else {
        Err(StampError::InvalidFits(format!(
            "cfitsio status {status} while {action}"
        )))
    }
}
