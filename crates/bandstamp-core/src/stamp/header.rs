use tracing::debug;

use crate::error::Result;
use crate::io::fits_header::FitsHeader;
use crate::wcs::CoordinateMapper;

/// Header of one band's stamp.
///
/// `reference_pixel` is zero-based like every pixel coordinate in this crate.
/// In `cards` it is stored one-based as `CRPIX1/2`, so reading a written
/// stamp back through [`CoordinateMapper::from_header`] gives the same
/// reference point.
#[derive(Clone, Debug)]
pub struct StampHeader {
    pub width: usize,
    pub height: usize,
    pub reference_pixel: (f64, f64),
    pub reference_sky: (f64, f64),
    pub cards: FitsHeader,
}

/// Build a stamp header from a band's frame header.
///
/// All cards of `frame_header` pass through unchanged except the image size
/// and the reference point. The reference sky position is always taken from
/// the reference band's mapper at the shared pixel center, so every band's
/// stamp carries the same coordinate anchor.
pub fn synthesize(
    frame_header: &FitsHeader,
    reference_mapper: &CoordinateMapper,
    center_col: f64,
    center_row: f64,
    width: usize,
    height: usize,
) -> Result<StampHeader> {
    let reference_pixel = (
        (width as f64 - 1.0) / 2.0,
        (height as f64 - 1.0) / 2.0,
    );
    let reference_sky = reference_mapper.pixel_to_sky(center_col, center_row)?;

    let mut cards = frame_header.clone();
    cards.set("NAXIS1", width);
    cards.set("NAXIS2", height);
    cards.set("CRPIX1", reference_pixel.0 + 1.0);
    cards.set("CRPIX2", reference_pixel.1 + 1.0);
    cards.set("CRVAL1", reference_sky.0);
    cards.set("CRVAL2", reference_sky.1);

    debug!(
        width,
        height,
        ra = reference_sky.0,
        dec = reference_sky.1,
        "Synthesized stamp header"
    );

    Ok(StampHeader {
        width,
        height,
        reference_pixel,
        reference_sky,
        cards,
    })
}
