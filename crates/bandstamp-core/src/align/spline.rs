//! Cubic B-spline interpolation along one dimension.
//!
//! Interpolation is done in two steps: the samples are converted in place to
//! B-spline coefficients with a recursive prefilter (mirror-symmetric
//! boundaries), then the continuous spline is evaluated with four taps.
//! Evaluating at an integer position reproduces the original sample.

use crate::consts::{CUBIC_SPLINE_POLE, SPLINE_PREFILTER_TOLERANCE};

/// Convert samples to cubic B-spline coefficients in place.
pub fn prefilter_line(line: &mut [f64]) {
    let n = line.len();
    if n < 2 {
        return;
    }

    let z = CUBIC_SPLINE_POLE;
    let gain = (1.0 - z) * (1.0 - 1.0 / z);
    for v in line.iter_mut() {
        *v *= gain;
    }

    line[0] = initial_causal_coefficient(line, z);
    for k in 1..n {
        line[k] += z * line[k - 1];
    }

    line[n - 1] = initial_anticausal_coefficient(line, z);
    for k in (0..n - 1).rev() {
        line[k] = z * (line[k + 1] - line[k]);
    }
}

fn initial_causal_coefficient(c: &[f64], z: f64) -> f64 {
    let n = c.len();
    let horizon = (SPLINE_PREFILTER_TOLERANCE.ln() / z.abs().ln()).ceil() as usize;

    if horizon < n {
        // Truncated geometric sum.
        let mut zn = z;
        let mut sum = c[0];
        for &v in &c[1..horizon] {
            sum += zn * v;
            zn *= z;
        }
        sum
    } else {
        // Exact mirror-symmetric sum.
        let iz = 1.0 / z;
        let mut zn = z;
        let mut z2n = z.powi(n as i32 - 1);
        let mut sum = c[0] + z2n * c[n - 1];
        z2n *= z2n * iz;
        for &v in &c[1..n - 1] {
            sum += (zn + z2n) * v;
            zn *= z;
            z2n *= iz;
        }
        sum / (1.0 - zn * zn)
    }
}

fn initial_anticausal_coefficient(c: &[f64], z: f64) -> f64 {
    let n = c.len();
    (z / (z * z - 1.0)) * (c[n - 1] + z * c[n - 2])
}

/// Weights of the four coefficients around `x` for fractional part `t`.
pub fn cubic_bspline_weights(t: f64) -> [f64; 4] {
    let u = 1.0 - t;
    [
        u * u * u / 6.0,
        2.0 / 3.0 - t * t + 0.5 * t * t * t,
        2.0 / 3.0 - u * u + 0.5 * u * u * u,
        t * t * t / 6.0,
    ]
}

/// Evaluate the spline defined by `coeffs` at position `x`.
///
/// Coefficients outside `[0, n-1]` are taken from the mirror-symmetric
/// extension, consistent with [`prefilter_line`].
pub fn sample_line(coeffs: &[f64], x: f64) -> f64 {
    let n = coeffs.len();
    if n == 1 {
        return coeffs[0];
    }

    let base = x.floor();
    let weights = cubic_bspline_weights(x - base);
    let first = base as i64 - 1;

    weights
        .iter()
        .enumerate()
        .map(|(k, w)| w * coeffs[mirror_index(first + k as i64, n)])
        .sum()
}

/// Map any integer index onto `[0, n-1]` by mirror-symmetric reflection
/// (the edge sample is not repeated).
fn mirror_index(i: i64, n: usize) -> usize {
    let period = 2 * (n as i64 - 1);
    let mut m = i.rem_euclid(period);
    if m >= n as i64 {
        m = period - m;
    }
    m as usize
}
