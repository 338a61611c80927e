use std::ffi::CString;
use std::path::Path;

use fitsio::images::{ImageDescription, ImageType};
use fitsio::{sys, FitsFile};
use ndarray::Array2;

use crate::error::{Result, StampError};

use super::fits::check_status;
use super::fits_header::FitsHeader;

/// Keywords that describe the data unit layout. cfitsio generates them and
/// they are never copied from a template header.
const STRUCTURAL_KEYWORDS: &[&str] = &[
    "SIMPLE", "XTENSION", "BITPIX", "NAXIS", "NAXIS1", "NAXIS2", "NAXIS3", "EXTEND", "PCOUNT",
    "GCOUNT", "BSCALE", "BZERO", "CHECKSUM", "DATASUM", "END",
];

/// Write a `[[col, row]]` image as a single-HDU FITS file with 32-bit float
/// samples, replacing any existing file.
///
/// Non-structural cards of `header` are appended after the mandatory
/// keywords. Every card is formatted before the file is created, so a card
/// that does not fit in one record fails without touching `path`.
pub fn write_image(path: &Path, data: &Array2<f32>, header: &FitsHeader) -> Result<()> {
    let records = header
        .cards()
        .iter()
        .filter(|c| c.value.is_none() || !STRUCTURAL_KEYWORDS.contains(&c.keyword.as_str()))
        .map(|card| {
            let record = card.format()?;
            CString::new(record.to_vec())
                .map_err(|e| StampError::InvalidFits(format!("card {}: {e}", card.keyword)))
        })
        .collect::<Result<Vec<_>>>()?;

    let (cols, rows) = data.dim();
    let description = ImageDescription {
        data_type: ImageType::Float,
        dimensions: &[rows, cols],
    };
    let mut fptr = FitsFile::create(path)
        .with_custom_primary(&description)
        .overwrite()
        .open()?;
    let hdu = fptr.primary_hdu()?;

    let mut status = 0;
    for record in &records {
        unsafe {
            sys::ffprec(fptr.as_raw(), record.as_ptr(), &mut status);
        }
        check_status(status, "writing a header record")?;
    }

    // NAXIS1 varies fastest on disk.
    let pixels: Vec<f32> = data.t().iter().copied().collect();
    hdu.write_image(&mut fptr, &pixels)?;
    Ok(())
}
