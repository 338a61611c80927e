#![allow(dead_code)]

use std::path::Path;

use bandstamp_core::frame::FrameImage;
use bandstamp_core::io::fits_header::{Card, FitsHeader};
use bandstamp_core::io::fits_writer::write_image;
use ndarray::Array2;

/// 0.396 arcsec/px, in degrees.
pub const PIXEL_SCALE: f64 = 0.396 / 3600.0;

/// Sky position used as the reference point of the synthetic frames.
pub const TARGET_RA: f64 = 150.0;
pub const TARGET_DEC: f64 = 2.0;

/// Gnomonic header with RA increasing to the left. `crpix` is zero-based and
/// written one-based.
pub fn tan_header(cols: usize, rows: usize, crpix: (f64, f64), crval: (f64, f64)) -> FitsHeader {
    [
        Card::new("SIMPLE", true),
        Card::new("BITPIX", -32i64),
        Card::new("NAXIS", 2i64),
        Card::new("NAXIS1", cols),
        Card::new("NAXIS2", rows),
        Card::new("CTYPE1", "RA---TAN"),
        Card::new("CTYPE2", "DEC--TAN"),
        Card::new("CRPIX1", crpix.0 + 1.0),
        Card::new("CRPIX2", crpix.1 + 1.0),
        Card::new("CRVAL1", crval.0),
        Card::new("CRVAL2", crval.1),
        Card::new("CD1_1", -PIXEL_SCALE),
        Card::new("CD1_2", 0.0),
        Card::new("CD2_1", 0.0),
        Card::new("CD2_2", PIXEL_SCALE),
        Card::new("EXPTIME", 53.9).with_comment("seconds"),
    ]
    .into_iter()
    .collect()
}

/// Header of a band whose target falls at zero-based pixel `target_pixel`.
pub fn band_header(cols: usize, rows: usize, target_pixel: (f64, f64), band: &str) -> FitsHeader {
    let mut header = tan_header(cols, rows, target_pixel, (TARGET_RA, TARGET_DEC));
    header.push(Card::new("FILTER", band));
    header
}

/// Symmetric Gaussian point source on a flat zero background.
pub fn gaussian_image(
    cols: usize,
    rows: usize,
    center: (f64, f64),
    sigma: f64,
    amplitude: f32,
) -> Array2<f32> {
    let two_s2 = 2.0 * sigma * sigma;
    Array2::from_shape_fn((cols, rows), |(c, r)| {
        let dc = c as f64 - center.0;
        let dr = r as f64 - center.1;
        amplitude * (-(dc * dc + dr * dr) / two_s2).exp() as f32
    })
}

/// Frame with a point source exactly where the target falls.
pub fn point_source_frame(band: &str, size: usize, target_pixel: (f64, f64)) -> FrameImage {
    let header = band_header(size, size, target_pixel, band);
    let data = gaussian_image(size, size, target_pixel, 2.0, 1000.0);
    FrameImage::from_header(band, data, header).unwrap()
}

/// Index of the brightest pixel as `(col, row)`.
pub fn peak_position(data: &Array2<f32>) -> (usize, usize) {
    let mut best = (0, 0);
    let mut best_val = f32::NEG_INFINITY;
    for ((c, r), &v) in data.indexed_iter() {
        if v > best_val {
            best_val = v;
            best = (c, r);
        }
    }
    best
}

/// `[[col, row]] = col * 1000 + row`, handy for checking slices.
pub fn index_image(cols: usize, rows: usize) -> Array2<f32> {
    Array2::from_shape_fn((cols, rows), |(c, r)| (c * 1000 + r) as f32)
}

pub fn write_frame(dir: &Path, frame: &FrameImage) {
    let path = dir.join(format!("frame-{}.fits", frame.band));
    write_image(&path, &frame.data, &frame.header).unwrap();
}
