use tracing::debug;

use crate::consts::DEFAULT_LONPOLE;
use crate::error::{Result, StampError};
use crate::io::fits_header::FitsHeader;

use super::projection::{celestial_to_native, native_to_celestial, Projection};

/// Linear part of a WCS: pixel offsets to intermediate world coordinates
/// (degrees), as a 2x2 `CDi_j` matrix.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinearTransform {
    cd: [[f64; 2]; 2],
    inv: [[f64; 2]; 2],
}

impl LinearTransform {
    pub fn new(cd: [[f64; 2]; 2]) -> Result<Self> {
        if cd.iter().flatten().any(|v| !v.is_finite()) {
            return Err(StampError::InvalidCoordinateSystem(
                "non-finite linear transform".into(),
            ));
        }
        let det = cd[0][0] * cd[1][1] - cd[0][1] * cd[1][0];
        if det.abs() < f64::MIN_POSITIVE || !det.is_finite() {
            return Err(StampError::InvalidCoordinateSystem(
                "singular linear transform".into(),
            ));
        }
        let inv = [
            [cd[1][1] / det, -cd[0][1] / det],
            [-cd[1][0] / det, cd[0][0] / det],
        ];
        Ok(Self { cd, inv })
    }

    /// Parse from header keywords.
    ///
    /// Priority: `CDi_j`, then `PCi_j` scaled by `CDELTi`, then `CDELTi`
    /// with the legacy `CROTA2` rotation.
    pub fn from_header(header: &FitsHeader) -> Result<Self> {
        const CD_KEYS: [&str; 4] = ["CD1_1", "CD1_2", "CD2_1", "CD2_2"];
        const PC_KEYS: [&str; 4] = ["PC1_1", "PC1_2", "PC2_1", "PC2_2"];

        if CD_KEYS.iter().any(|k| header.contains(k)) {
            // Absent CDi_j elements default to zero.
            let get = |k: &str| header.get_f64(k).unwrap_or(0.0);
            return Self::new([
                [get("CD1_1"), get("CD1_2")],
                [get("CD2_1"), get("CD2_2")],
            ]);
        }

        let cdelt1 = header.get_f64("CDELT1");
        let cdelt2 = header.get_f64("CDELT2");
        let (cdelt1, cdelt2) = match (cdelt1, cdelt2) {
            (Some(a), Some(b)) => (a, b),
            _ => {
                return Err(StampError::InvalidCoordinateSystem(
                    "no CDi_j matrix and no CDELT1/CDELT2 scale".into(),
                ))
            }
        };

        if PC_KEYS.iter().any(|k| header.contains(k)) {
            let pc11 = header.get_f64("PC1_1").unwrap_or(1.0);
            let pc12 = header.get_f64("PC1_2").unwrap_or(0.0);
            let pc21 = header.get_f64("PC2_1").unwrap_or(0.0);
            let pc22 = header.get_f64("PC2_2").unwrap_or(1.0);
            return Self::new([
                [cdelt1 * pc11, cdelt1 * pc12],
                [cdelt2 * pc21, cdelt2 * pc22],
            ]);
        }

        let (sin_r, cos_r) = header
            .get_f64("CROTA2")
            .unwrap_or(0.0)
            .to_radians()
            .sin_cos();
        Self::new([
            [cdelt1 * cos_r, -cdelt2 * sin_r],
            [cdelt1 * sin_r, cdelt2 * cos_r],
        ])
    }

    pub fn matrix(&self) -> [[f64; 2]; 2] {
        self.cd
    }

    /// Pixel offset to intermediate world coordinates.
    pub fn apply(&self, dx: f64, dy: f64) -> (f64, f64) {
        (
            self.cd[0][0] * dx + self.cd[0][1] * dy,
            self.cd[1][0] * dx + self.cd[1][1] * dy,
        )
    }

    /// Intermediate world coordinates to pixel offset.
    pub fn invert(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.inv[0][0] * x + self.inv[0][1] * y,
            self.inv[1][0] * x + self.inv[1][1] * y,
        )
    }

    /// Mean pixel scale in degrees per pixel.
    pub fn pixel_scale(&self) -> f64 {
        (self.cd[0][0] * self.cd[1][1] - self.cd[0][1] * self.cd[1][0])
            .abs()
            .sqrt()
    }
}

/// Mapping between sky coordinates (ra, dec in degrees) and zero-based pixel
/// coordinates (col, row) of one frame.
///
/// Pixel (0, 0) is the centre of the first stored pixel; the one-based FITS
/// `CRPIXi` convention is converted on construction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CoordinateMapper {
    projection: Projection,
    /// Zero-based reference pixel.
    crpix: (f64, f64),
    /// Reference sky coordinate (ra, dec).
    crval: (f64, f64),
    linear: LinearTransform,
    lonpole: f64,
}

impl CoordinateMapper {
    /// Build a mapper from a zero-based reference pixel, its sky position and
    /// a `CDi_j` matrix in degrees per pixel.
    pub fn new(
        projection: Projection,
        reference_pixel: (f64, f64),
        reference_sky: (f64, f64),
        cd: [[f64; 2]; 2],
    ) -> Result<Self> {
        Self::with_lonpole(projection, reference_pixel, reference_sky, cd, DEFAULT_LONPOLE)
    }

    pub fn with_lonpole(
        projection: Projection,
        reference_pixel: (f64, f64),
        reference_sky: (f64, f64),
        cd: [[f64; 2]; 2],
        lonpole: f64,
    ) -> Result<Self> {
        let values = [
            reference_pixel.0,
            reference_pixel.1,
            reference_sky.0,
            reference_sky.1,
            lonpole,
        ];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(StampError::InvalidCoordinateSystem(
                "non-finite reference values".into(),
            ));
        }
        if !(-90.0..=90.0).contains(&reference_sky.1) {
            return Err(StampError::InvalidCoordinateSystem(format!(
                "reference declination {} outside [-90, 90]",
                reference_sky.1
            )));
        }
        Ok(Self {
            projection,
            crpix: reference_pixel,
            crval: reference_sky,
            linear: LinearTransform::new(cd)?,
            lonpole,
        })
    }

    /// Build a mapper from a frame's header keywords.
    pub fn from_header(header: &FitsHeader) -> Result<Self> {
        let projection = parse_ctypes(header)?;

        let require = |key: &str| {
            header.get_f64(key).ok_or_else(|| {
                StampError::InvalidCoordinateSystem(format!("missing or non-numeric {key}"))
            })
        };
        let crpix1 = require("CRPIX1")?;
        let crpix2 = require("CRPIX2")?;
        let crval1 = require("CRVAL1")?;
        let crval2 = require("CRVAL2")?;
        let lonpole = header.get_f64("LONPOLE").unwrap_or(DEFAULT_LONPOLE);
        let linear = LinearTransform::from_header(header)?;

        let mapper = Self::with_lonpole(
            projection,
            (crpix1 - 1.0, crpix2 - 1.0),
            (crval1, crval2),
            linear.matrix(),
            lonpole,
        )?;
        debug!(
            projection = %projection,
            crpix1,
            crpix2,
            crval1,
            crval2,
            scale_arcsec = mapper.pixel_scale() * 3600.0,
            "Parsed coordinate system"
        );
        Ok(mapper)
    }

    pub fn projection(&self) -> Projection {
        self.projection
    }

    /// Zero-based reference pixel.
    pub fn reference_pixel(&self) -> (f64, f64) {
        self.crpix
    }

    pub fn reference_sky(&self) -> (f64, f64) {
        self.crval
    }

    pub fn linear(&self) -> &LinearTransform {
        &self.linear
    }

    pub fn lonpole(&self) -> f64 {
        self.lonpole
    }

    /// Pixel scale in degrees per pixel.
    pub fn pixel_scale(&self) -> f64 {
        self.linear.pixel_scale()
    }

    /// Sky (ra, dec) in degrees to zero-based pixel (col, row).
    pub fn sky_to_pixel(&self, ra: f64, dec: f64) -> Result<(f64, f64)> {
        if !ra.is_finite() || !dec.is_finite() || !(-90.0..=90.0).contains(&dec) {
            return Err(StampError::InvalidCoordinateSystem(format!(
                "sky position ({ra}, {dec}) is not a valid coordinate"
            )));
        }
        let (phi, theta) = celestial_to_native(ra, dec, self.crval, self.lonpole);
        let r = self.projection.r_from_theta(theta).ok_or_else(|| {
            StampError::InvalidCoordinateSystem(format!(
                "sky position ({ra}, {dec}) cannot be represented by the {} projection",
                self.projection
            ))
        })?;
        let (sin_phi, cos_phi) = phi.to_radians().sin_cos();
        let (x, y) = (r * sin_phi, -r * cos_phi);
        let (dx, dy) = self.linear.invert(x, y);
        Ok((self.crpix.0 + dx, self.crpix.1 + dy))
    }

    /// Zero-based pixel (col, row) to sky (ra, dec) in degrees.
    pub fn pixel_to_sky(&self, col: f64, row: f64) -> Result<(f64, f64)> {
        if !col.is_finite() || !row.is_finite() {
            return Err(StampError::InvalidCoordinateSystem(format!(
                "pixel position ({col}, {row}) is not finite"
            )));
        }
        let (x, y) = self.linear.apply(col - self.crpix.0, row - self.crpix.1);
        let r = x.hypot(y);
        let phi = if r == 0.0 { 0.0 } else { x.atan2(-y).to_degrees() };
        let theta = self.projection.theta_from_r(r).ok_or_else(|| {
            StampError::InvalidCoordinateSystem(format!(
                "pixel position ({col}, {row}) lies outside the {} projection domain",
                self.projection
            ))
        })?;
        Ok(native_to_celestial(phi, theta, self.crval, self.lonpole))
    }
}

/// Check `CTYPE1`/`CTYPE2` and return the shared projection.
fn parse_ctypes(header: &FitsHeader) -> Result<Projection> {
    let ctype1 = header.get_str("CTYPE1").ok_or_else(|| {
        StampError::InvalidCoordinateSystem("missing CTYPE1".into())
    })?;
    let ctype2 = header.get_str("CTYPE2").ok_or_else(|| {
        StampError::InvalidCoordinateSystem("missing CTYPE2".into())
    })?;

    let code1 = split_ctype(ctype1, "RA--")?;
    let code2 = split_ctype(ctype2, "DEC-")?;
    if code1 != code2 {
        return Err(StampError::InvalidCoordinateSystem(format!(
            "CTYPE1 '{ctype1}' and CTYPE2 '{ctype2}' use different projections"
        )));
    }
    Projection::from_code(code1).ok_or_else(|| {
        StampError::InvalidCoordinateSystem(format!("unsupported projection '{code1}'"))
    })
}

/// Split an 8-character `CTYPEi` like `RA---TAN` into its projection code.
fn split_ctype<'a>(ctype: &'a str, axis: &str) -> Result<&'a str> {
    let ctype = ctype.trim_end();
    if !ctype.is_ascii() || !ctype.starts_with(axis) {
        return Err(StampError::InvalidCoordinateSystem(format!(
            "expected a {}* axis, got '{ctype}'",
            axis.trim_end_matches('-')
        )));
    }
    if ctype.len() != 8 || &ctype[4..5] != "-" {
        return Err(StampError::InvalidCoordinateSystem(format!(
            "unsupported axis type '{ctype}' (distortion conventions are not handled)"
        )));
    }
    Ok(&ctype[5..])
}
