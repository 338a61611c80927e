use ndarray::{s, Array2};

use crate::consts::BOUNDARY_TOLERANCE;
use crate::error::{Result, StampError};

/// Half-open pixel rectangle `[x0, x1) x [y0, y1)` of a stamp in the source
/// grid. `x` runs along columns, `y` along rows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StampBounds {
    pub x0: i64,
    pub x1: i64,
    pub y0: i64,
    pub y1: i64,
}

impl StampBounds {
    /// Bounds of a `width x height` stamp centered on `(center_col, center_row)`.
    ///
    /// Even sizes span `[c - w/2, c + w/2)`. Odd sizes are shifted by half a
    /// pixel so the center pixel is included with `(w - 1) / 2` pixels on each
    /// side. Both dimensions must share parity, and every bound must land on
    /// an integer.
    pub fn compute(center_col: f64, center_row: f64, width: usize, height: usize) -> Result<Self> {
        if width % 2 != height % 2 {
            return Err(StampError::ParityMismatch { width, height });
        }
        if width == 0 || height == 0 {
            return Err(StampError::InvalidConfig(format!(
                "stamp size must be non-zero, got {width}x{height}"
            )));
        }

        let (x0, x1) = half_extent(center_col, width);
        let (y0, y1) = half_extent(center_row, height);

        if [x0, x1, y0, y1].iter().any(|v| !is_integral(*v)) {
            return Err(StampError::NonIntegerBoundary { x0, x1, y0, y1 });
        }

        Ok(Self {
            x0: x0.round() as i64,
            x1: x1.round() as i64,
            y0: y0.round() as i64,
            y1: y1.round() as i64,
        })
    }

    pub fn width(&self) -> usize {
        (self.x1 - self.x0) as usize
    }

    pub fn height(&self) -> usize {
        (self.y1 - self.y0) as usize
    }

    /// Check that the rectangle lies inside a `cols x rows` image.
    pub fn check_within(&self, cols: usize, rows: usize) -> Result<()> {
        let inside = self.x0 >= 0
            && self.y0 >= 0
            && self.x1 <= cols as i64
            && self.y1 <= rows as i64;
        if inside {
            Ok(())
        } else {
            Err(StampError::OutOfBounds {
                x0: self.x0,
                x1: self.x1,
                y0: self.y0,
                y1: self.y1,
                cols,
                rows,
            })
        }
    }
}

fn half_extent(center: f64, size: usize) -> (f64, f64) {
    if size % 2 == 0 {
        let d = (size / 2) as f64;
        (center - d, center + d)
    } else {
        let d = size as f64 / 2.0;
        (center - d + 0.5, center + d + 0.5)
    }
}

fn is_integral(v: f64) -> bool {
    v.is_finite() && (v - v.round()).abs() <= BOUNDARY_TOLERANCE
}

/// Cut a `width x height` stamp out of `image` around the given pixel center.
///
/// The result has shape exactly `(width, height)` and is a copy of the
/// source pixels; no interpolation takes place.
pub fn extract(
    image: &Array2<f32>,
    center_col: f64,
    center_row: f64,
    width: usize,
    height: usize,
) -> Result<Array2<f32>> {
    let bounds = StampBounds::compute(center_col, center_row, width, height)?;
    let (cols, rows) = image.dim();
    bounds.check_within(cols, rows)?;

    let (x0, x1) = (bounds.x0 as usize, bounds.x1 as usize);
    let (y0, y1) = (bounds.y0 as usize, bounds.y1 as usize);
    Ok(image.slice(s![x0..x1, y0..y1]).to_owned())
}
