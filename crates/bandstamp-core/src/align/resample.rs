use ndarray::{Array2, ArrayView1, Axis};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::consts::PARALLEL_PIXEL_THRESHOLD;
use crate::frame::PixelShift;

use super::spline::{prefilter_line, sample_line};

/// How samples that fall outside the source image are filled.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum EdgeMode {
    /// Positions outside `[0, n-1]` along either axis take this value.
    Constant(f32),
    /// Positions are clamped onto the nearest edge pixel.
    Nearest,
}

impl Default for EdgeMode {
    fn default() -> Self {
        Self::Constant(0.0)
    }
}

impl std::fmt::Display for EdgeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Constant(v) => write!(f, "Constant ({v})"),
            Self::Nearest => write!(f, "Nearest"),
        }
    }
}

/// Shift an image by a sub-pixel displacement with cubic B-spline
/// interpolation.
///
/// Output pixel `[[c, r]]` samples the input at `(c + dcol, r + drow)`, so the
/// content moves by `-shift`. The shape is preserved and the input is not
/// modified.
pub fn resample(image: &Array2<f32>, shift: &PixelShift, edge: EdgeMode) -> Array2<f32> {
    let along_cols = shift_axis(image, Axis(0), shift.dcol, edge);
    shift_axis(&along_cols, Axis(1), shift.drow, edge)
}

/// Apply a 1D spline shift to every lane along `axis`.
fn shift_axis(data: &Array2<f32>, axis: Axis, offset: f64, edge: EdgeMode) -> Array2<f32> {
    let (cols, rows) = data.dim();
    let lanes: Vec<ArrayView1<f32>> = data.lanes(axis).into_iter().collect();

    let shifted: Vec<Vec<f32>> = if cols * rows >= PARALLEL_PIXEL_THRESHOLD {
        lanes
            .par_iter()
            .map(|lane| shift_lane(lane, offset, edge))
            .collect()
    } else {
        lanes
            .iter()
            .map(|lane| shift_lane(lane, offset, edge))
            .collect()
    };

    let mut result = Array2::<f32>::zeros((cols, rows));
    for (mut out_lane, values) in result.lanes_mut(axis).into_iter().zip(shifted) {
        for (dst, v) in out_lane.iter_mut().zip(values) {
            *dst = v;
        }
    }
    result
}

fn shift_lane(lane: &ArrayView1<f32>, offset: f64, edge: EdgeMode) -> Vec<f32> {
    let n = lane.len();
    if n == 0 {
        return Vec::new();
    }
    let mut coeffs: Vec<f64> = lane.iter().map(|&v| v as f64).collect();
    prefilter_line(&mut coeffs);

    let last = (n - 1) as f64;
    (0..n)
        .map(|i| {
            let x = i as f64 + offset;
            match edge {
                EdgeMode::Constant(fill) => {
                    if x < 0.0 || x > last {
                        fill
                    } else {
                        sample_line(&coeffs, x) as f32
                    }
                }
                EdgeMode::Nearest => sample_line(&coeffs, x.clamp(0.0, last)) as f32,
            }
        })
        .collect()
}
