use tracing::debug;

use crate::error::Result;
use crate::frame::{PixelShift, TargetPosition};
use crate::wcs::CoordinateMapper;

/// Relative tolerance when comparing the linear terms of two mappers.
const LINEAR_TERM_TOLERANCE: f64 = 1e-6;

/// Displacement, in the moving band's pixels, between where `target` falls in
/// the moving grid and where it falls in the reference grid.
///
/// Only a local translation is modelled. Bands whose grids also differ by
/// rotation or scale are registered correctly at the target itself but
/// drift away from it.
pub fn estimate_shift(
    moving: &CoordinateMapper,
    reference: &CoordinateMapper,
    target: &TargetPosition,
) -> Result<PixelShift> {
    let (mov_col, mov_row) = moving.sky_to_pixel(target.ra, target.dec)?;
    let (ref_col, ref_row) = reference.sky_to_pixel(target.ra, target.dec)?;

    if !same_linear_terms(moving, reference) {
        debug!(
            moving_scale = moving.pixel_scale(),
            reference_scale = reference.pixel_scale(),
            "Grids differ by more than a translation; shift is only valid near the target"
        );
    }

    Ok(PixelShift::new(mov_col - ref_col, mov_row - ref_row))
}

fn same_linear_terms(a: &CoordinateMapper, b: &CoordinateMapper) -> bool {
    let (ma, mb) = (a.linear().matrix(), b.linear().matrix());
    let scale = a.pixel_scale().max(b.pixel_scale());
    ma.iter()
        .flatten()
        .zip(mb.iter().flatten())
        .all(|(x, y)| (x - y).abs() <= LINEAR_TERM_TOLERANCE * scale)
        && a.projection() == b.projection()
}
