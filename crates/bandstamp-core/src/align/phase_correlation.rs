use ndarray::{Array2, Axis};
use num_complex::Complex;
use rustfft::FftPlanner;

use crate::error::{Result, StampError};
use crate::frame::PixelShift;

/// Residual translation of `moving` relative to `reference`, measured with
/// FFT phase correlation.
///
/// The result uses the resampler's convention: resampling `moving` by the
/// returned shift would bring it onto `reference`. For well-registered
/// stamps it is close to zero.
pub fn residual_shift(reference: &Array2<f32>, moving: &Array2<f32>) -> Result<PixelShift> {
    let (cols, rows) = reference.dim();
    let (m_cols, m_rows) = moving.dim();
    if cols != m_cols || rows != m_rows {
        return Err(StampError::ShapeMismatch {
            a_cols: cols,
            a_rows: rows,
            b_cols: m_cols,
            b_rows: m_rows,
        });
    }
    if cols < 3 || rows < 3 {
        return Err(StampError::InvalidConfig(format!(
            "phase correlation needs at least 3x3 pixels, got {cols}x{rows}"
        )));
    }

    let ref_fft = fft2d(&apply_hann(reference));
    let mov_fft = fft2d(&apply_hann(moving));

    // Normalized cross-power spectrum; its inverse peaks at the displacement.
    let mut cross = ndarray::Zip::from(&mov_fft)
        .and(&ref_fft)
        .map_collect(|m, r| {
            let c = m * r.conj();
            let mag = c.norm();
            if mag > 1e-12 {
                c / mag
            } else {
                Complex::new(0.0, 0.0)
            }
        });
    transform_axes(&mut cross, true);
    let correlation = cross.mapv(|c| c.re);

    let (peak_col, peak_row) = find_peak(&correlation);
    let dcol = signed_index(peak_col, cols) + refine_axis(&correlation, Axis(0), peak_col, peak_row);
    let drow = signed_index(peak_row, rows) + refine_axis(&correlation, Axis(1), peak_col, peak_row);

    Ok(PixelShift::new(dcol, drow))
}

fn apply_hann(data: &Array2<f32>) -> Array2<f32> {
    let (cols, rows) = data.dim();
    let window = |i: usize, n: usize| {
        0.5 * (1.0 - (std::f64::consts::TAU * i as f64 / n as f64).cos())
    };
    Array2::from_shape_fn((cols, rows), |(c, r)| {
        data[[c, r]] * (window(c, cols) * window(r, rows)) as f32
    })
}

fn fft2d(data: &Array2<f32>) -> Array2<Complex<f64>> {
    let mut spectrum = data.mapv(|v| Complex::new(v as f64, 0.0));
    transform_axes(&mut spectrum, false);
    spectrum
}

/// In-place separable FFT over both axes. The inverse is normalized.
fn transform_axes(data: &mut Array2<Complex<f64>>, inverse: bool) {
    let mut planner = FftPlanner::new();
    for axis in [Axis(0), Axis(1)] {
        let len = data.len_of(axis);
        let fft = if inverse {
            planner.plan_fft_inverse(len)
        } else {
            planner.plan_fft_forward(len)
        };
        let mut buffer = vec![Complex::new(0.0, 0.0); len];
        for mut lane in data.lanes_mut(axis) {
            for (b, v) in buffer.iter_mut().zip(lane.iter()) {
                *b = *v;
            }
            fft.process(&mut buffer);
            for (v, b) in lane.iter_mut().zip(&buffer) {
                *v = *b;
            }
        }
    }
    if inverse {
        let scale = 1.0 / data.len() as f64;
        data.mapv_inplace(|c| c * scale);
    }
}

fn find_peak(data: &Array2<f64>) -> (usize, usize) {
    let mut best = (0, 0);
    let mut best_val = f64::NEG_INFINITY;
    for ((c, r), &v) in data.indexed_iter() {
        if v > best_val {
            best_val = v;
            best = (c, r);
        }
    }
    best
}

/// Map an FFT index onto a signed displacement (wrap-around).
fn signed_index(idx: usize, n: usize) -> f64 {
    if idx > n / 2 {
        idx as f64 - n as f64
    } else {
        idx as f64
    }
}

/// Parabola fit through the peak and its two (periodic) neighbours along
/// `axis`, clamped to half a pixel.
fn refine_axis(correlation: &Array2<f64>, axis: Axis, col: usize, row: usize) -> f64 {
    let n = correlation.len_of(axis);
    let (idx, fixed) = if axis == Axis(0) { (col, row) } else { (row, col) };
    let at = |i: usize| {
        if axis == Axis(0) {
            correlation[[i, fixed]]
        } else {
            correlation[[fixed, i]]
        }
    };

    let prev = at((idx + n - 1) % n);
    let curr = at(idx);
    let next = at((idx + 1) % n);

    let denom = prev - 2.0 * curr + next;
    if denom.abs() > 1e-12 {
        ((prev - next) / (2.0 * denom)).clamp(-0.5, 0.5)
    } else {
        0.0
    }
}
