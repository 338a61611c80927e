use serde::{Deserialize, Serialize};

/// Zenithal projections supported by the coordinate mapper.
///
/// All of them place the native reference point at the native pole
/// (phi0, theta0) = (0, 90), so they differ only in the radial function
/// R(theta) relating native latitude to distance from the reference pixel
/// in the intermediate world plane.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Projection {
    /// Gnomonic.
    Tan,
    /// Orthographic / synthesis.
    Sin,
    /// Zenithal equidistant.
    Arc,
    /// Stereographic.
    Stg,
}

impl Projection {
    /// Parse the three-letter code from a `CTYPEi` value.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "TAN" => Some(Self::Tan),
            "SIN" => Some(Self::Sin),
            "ARC" => Some(Self::Arc),
            "STG" => Some(Self::Stg),
            _ => None,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Self::Tan => "TAN",
            Self::Sin => "SIN",
            Self::Arc => "ARC",
            Self::Stg => "STG",
        }
    }

    /// Native latitude (degrees) for a radial distance `r` (degrees).
    ///
    /// Returns `None` when `r` lies outside the projection's valid disk.
    pub fn theta_from_r(self, r: f64) -> Option<f64> {
        let r_rad = r.to_radians();
        let theta = match self {
            Self::Tan => 1.0f64.atan2(r_rad).to_degrees(),
            Self::Sin => {
                if r_rad > 1.0 + 1e-12 {
                    return None;
                }
                r_rad.min(1.0).acos().to_degrees()
            }
            Self::Arc => {
                if r > 180.0 {
                    return None;
                }
                90.0 - r
            }
            Self::Stg => 90.0 - 2.0 * (r_rad / 2.0).atan().to_degrees(),
        };
        Some(theta)
    }

    /// Radial distance (degrees) for a native latitude `theta` (degrees).
    ///
    /// Returns `None` for latitudes the projection cannot represent, e.g. the
    /// far hemisphere for the gnomonic projection.
    pub fn r_from_theta(self, theta: f64) -> Option<f64> {
        let t = theta.to_radians();
        let r_rad = match self {
            Self::Tan => {
                if theta <= 0.0 {
                    return None;
                }
                t.cos() / t.sin()
            }
            Self::Sin => {
                if theta < 0.0 {
                    return None;
                }
                t.cos()
            }
            Self::Arc => return Some(90.0 - theta),
            Self::Stg => {
                if theta <= -90.0 {
                    return None;
                }
                2.0 * ((90.0 - theta).to_radians() / 2.0).tan()
            }
        };
        Some(r_rad.to_degrees())
    }
}

impl std::fmt::Display for Projection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Rotate native spherical coordinates (phi, theta) to celestial (ra, dec).
///
/// `pole` is the celestial position (alpha_p, delta_p) of the native pole and
/// `lonpole` the native longitude of the celestial pole, all in degrees.
pub(crate) fn native_to_celestial(phi: f64, theta: f64, pole: (f64, f64), lonpole: f64) -> (f64, f64) {
    let (sin_t, cos_t) = theta.to_radians().sin_cos();
    let (sin_dp, cos_dp) = pole.1.to_radians().sin_cos();
    let (sin_dphi, cos_dphi) = (phi - lonpole).to_radians().sin_cos();

    let y = -cos_t * sin_dphi;
    let x = sin_t * cos_dp - cos_t * sin_dp * cos_dphi;
    let ra = pole.0 + y.atan2(x).to_degrees();
    // asin is ill-conditioned near the poles.
    let sin_dec = sin_t * sin_dp + cos_t * cos_dp * cos_dphi;
    let dec = sin_dec.atan2(x.hypot(y)).to_degrees();

    (normalize_ra(ra), dec)
}

/// Inverse of [`native_to_celestial`].
pub(crate) fn celestial_to_native(ra: f64, dec: f64, pole: (f64, f64), lonpole: f64) -> (f64, f64) {
    let (sin_d, cos_d) = dec.to_radians().sin_cos();
    let (sin_dp, cos_dp) = pole.1.to_radians().sin_cos();
    let (sin_da, cos_da) = (ra - pole.0).to_radians().sin_cos();

    let y = -cos_d * sin_da;
    let x = sin_d * cos_dp - cos_d * sin_dp * cos_da;
    let phi = lonpole + y.atan2(x).to_degrees();
    let sin_theta = sin_d * sin_dp + cos_d * cos_dp * cos_da;
    let theta = sin_theta.atan2(x.hypot(y)).to_degrees();

    (phi, theta)
}

/// Wrap a right ascension into [0, 360).
pub fn normalize_ra(ra: f64) -> f64 {
    let wrapped = ra.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs.
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}
