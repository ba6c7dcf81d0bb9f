//! Celestial coordinates and great-circle geometry
//!
//! Positions are ICRS-like equatorial coordinates held in radians. All
//! distances are computed on the unit sphere; no aberration, parallax or
//! refraction corrections are applied.

use crate::units::{Angle, AngleExt};
use nalgebra::Vector3;
use std::f64::consts::{FRAC_PI_2, TAU};
use thiserror::Error;

/// Milliarcseconds per radian
const MAS_PER_RADIAN: f64 = 180.0 / std::f64::consts::PI * 3600.0 * 1000.0;

/// Errors raised when constructing sky positions from raw values
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SkyError {
    #[error("declination {0} deg is outside [-90, 90]")]
    InvalidDeclination(f64),
    #[error("coordinate ({ra}, {dec}) is not finite")]
    NonFinite { ra: f64, dec: f64 },
}

/// An equatorial sky position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Equatorial {
    /// Right ascension in radians, normalised to [0, 2π)
    pub ra: f64,
    /// Declination in radians, in [-π/2, π/2]
    pub dec: f64,
}

impl Equatorial {
    /// Create a position from radians, wrapping RA into [0, 2π)
    pub fn from_radians(ra: f64, dec: f64) -> Self {
        Self {
            ra: ra.rem_euclid(TAU),
            dec: dec.clamp(-FRAC_PI_2, FRAC_PI_2),
        }
    }

    /// Create a position from degrees, wrapping RA into [0, 360)
    pub fn from_degrees(ra_deg: f64, dec_deg: f64) -> Self {
        Self::from_radians(ra_deg.to_radians(), dec_deg.to_radians())
    }

    /// Validating constructor for positions read from files
    pub fn try_from_degrees(ra_deg: f64, dec_deg: f64) -> Result<Self, SkyError> {
        if !ra_deg.is_finite() || !dec_deg.is_finite() {
            return Err(SkyError::NonFinite {
                ra: ra_deg,
                dec: dec_deg,
            });
        }
        if !(-90.0..=90.0).contains(&dec_deg) {
            return Err(SkyError::InvalidDeclination(dec_deg));
        }
        Ok(Self::from_degrees(ra_deg, dec_deg))
    }

    pub fn ra_degrees(&self) -> f64 {
        self.ra.to_degrees()
    }

    pub fn dec_degrees(&self) -> f64 {
        self.dec.to_degrees()
    }

    /// Great-circle distance to another position.
    ///
    /// Uses the Vincenty formula, which stays accurate for both very small
    /// and nearly antipodal separations.
    pub fn angular_distance(&self, other: &Equatorial) -> Angle {
        Angle::from_radians(self.angular_distance_radians(other))
    }

    /// Great-circle distance in radians
    pub fn angular_distance_radians(&self, other: &Equatorial) -> f64 {
        let (sin_d1, cos_d1) = self.dec.sin_cos();
        let (sin_d2, cos_d2) = other.dec.sin_cos();
        let (sin_dra, cos_dra) = (other.ra - self.ra).sin_cos();

        let num1 = cos_d2 * sin_dra;
        let num2 = cos_d1 * sin_d2 - sin_d1 * cos_d2 * cos_dra;
        let denominator = sin_d1 * sin_d2 + cos_d1 * cos_d2 * cos_dra;

        num1.hypot(num2).atan2(denominator)
    }

    /// Great-circle distance in milliarcseconds
    pub fn angular_distance_mas(&self, other: &Equatorial) -> f64 {
        self.angular_distance_radians(other) * MAS_PER_RADIAN
    }

    /// Cartesian unit vector on the celestial sphere
    pub fn to_unit_vector(&self) -> Vector3<f64> {
        let (sin_ra, cos_ra) = self.ra.sin_cos();
        let (sin_dec, cos_dec) = self.dec.sin_cos();
        Vector3::new(cos_dec * cos_ra, cos_dec * sin_ra, sin_dec)
    }

    /// Inverse of [`Equatorial::to_unit_vector`]; the input need not be normalised
    pub fn from_unit_vector(v: &Vector3<f64>) -> Self {
        let norm = v.norm();
        let dec = (v.z / norm).clamp(-1.0, 1.0).asin();
        let ra = v.y.atan2(v.x);
        Self::from_radians(ra, dec)
    }

    /// Position reached by moving `separation` along the great circle that
    /// leaves this point at `position_angle` (east of north).
    pub fn offset_by(&self, position_angle: Angle, separation: Angle) -> Self {
        let pa = position_angle.as_radians();
        let sep = separation.as_radians();
        let (sin_d1, cos_d1) = self.dec.sin_cos();
        let (sin_sep, cos_sep) = sep.sin_cos();

        let sin_d2 = (sin_d1 * cos_sep + cos_d1 * sin_sep * pa.cos()).clamp(-1.0, 1.0);
        let dec2 = sin_d2.asin();
        let dra = (pa.sin() * sin_sep * cos_d1).atan2(cos_sep - sin_d1 * sin_d2);

        Self::from_radians(self.ra + dra, dec2)
    }

    /// Position angle (east of north) of `other` as seen from this point
    pub fn position_angle(&self, other: &Equatorial) -> Angle {
        let dra = other.ra - self.ra;
        let (sin_d2, cos_d2) = other.dec.sin_cos();
        let y = dra.sin() * cos_d2;
        let x = self.dec.cos() * sin_d2 - self.dec.sin() * cos_d2 * dra.cos();
        Angle::from_radians(y.atan2(x))
    }

    /// Apply linear proper motion over `years`.
    ///
    /// `pm_ra_cosdec` and `pm_dec` are in mas/yr, with the RA component
    /// already multiplied by cos(dec) as in Gaia releases.
    pub fn propagate_proper_motion(&self, pm_ra_cosdec: f64, pm_dec: f64, years: f64) -> Self {
        let total_mas = pm_ra_cosdec.hypot(pm_dec) * years.abs();
        if total_mas == 0.0 {
            return *self;
        }
        let direction = if years >= 0.0 {
            pm_ra_cosdec.atan2(pm_dec)
        } else {
            (-pm_ra_cosdec).atan2(-pm_dec)
        };
        self.offset_by(
            Angle::from_radians(direction),
            Angle::from_milliarcseconds(total_mas),
        )
    }
}

/// Straight-line distance between two unit vectors separated by `angle`
pub fn chord_for_angle(angle: Angle) -> f64 {
    let theta = angle.as_radians().clamp(0.0, std::f64::consts::PI);
    2.0 * (theta / 2.0).sin()
}

/// Angle subtended by a chord of the unit sphere
pub fn angle_for_chord(chord: f64) -> Angle {
    Angle::from_radians(2.0 * (chord / 2.0).clamp(0.0, 1.0).asin())
}

/// Convert milliarcseconds to radians
pub fn mas_to_radians(mas: f64) -> f64 {
    mas / MAS_PER_RADIAN
}

/// Convert radians to milliarcseconds
pub fn radians_to_mas(rad: f64) -> f64 {
    rad * MAS_PER_RADIAN
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_ra_wraps_into_range() {
        let pos = Equatorial::from_degrees(-10.0, 0.0);
        assert_relative_eq!(pos.ra_degrees(), 350.0, epsilon = 1e-9);

        let pos = Equatorial::from_degrees(370.0, 0.0);
        assert_relative_eq!(pos.ra_degrees(), 10.0, epsilon = 1e-9);
    }

    #[test]
    fn test_try_from_degrees_rejects_bad_dec() {
        assert_eq!(
            Equatorial::try_from_degrees(10.0, 91.0),
            Err(SkyError::InvalidDeclination(91.0))
        );
        assert!(Equatorial::try_from_degrees(f64::NAN, 0.0).is_err());
        assert!(Equatorial::try_from_degrees(359.9, -90.0).is_ok());
    }

    #[test]
    fn test_distance_along_equator() {
        let a = Equatorial::from_degrees(10.0, 0.0);
        let b = Equatorial::from_degrees(11.0, 0.0);
        assert_relative_eq!(a.angular_distance(&b).as_degrees(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_distance_across_ra_wrap() {
        let a = Equatorial::from_degrees(359.5, 0.0);
        let b = Equatorial::from_degrees(0.5, 0.0);
        assert_relative_eq!(a.angular_distance(&b).as_degrees(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_distance_near_pole() {
        // Two points 1 arcsec from the pole on opposite meridians
        let a = Equatorial::from_degrees(0.0, 90.0 - 1.0 / 3600.0);
        let b = Equatorial::from_degrees(180.0, 90.0 - 1.0 / 3600.0);
        assert_relative_eq!(a.angular_distance(&b).as_arcseconds(), 2.0, epsilon = 1e-6);
    }

    #[test]
    fn test_distance_antipodal() {
        let a = Equatorial::from_degrees(0.0, 0.0);
        let b = Equatorial::from_degrees(180.0, 0.0);
        assert_relative_eq!(
            a.angular_distance_radians(&b),
            std::f64::consts::PI,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_small_separation_precision() {
        let a = Equatorial::from_degrees(150.0, 2.0);
        let b = a.offset_by(Angle::from_degrees(30.0), Angle::from_milliarcseconds(1.0));
        assert_relative_eq!(a.angular_distance_mas(&b), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_unit_vector_roundtrip() {
        let pos = Equatorial::from_degrees(123.4, -56.7);
        let v = pos.to_unit_vector();
        assert_relative_eq!(v.norm(), 1.0, epsilon = 1e-12);

        let back = Equatorial::from_unit_vector(&v);
        assert!(pos.angular_distance_mas(&back) < 1e-6);
    }

    #[test]
    fn test_offset_and_position_angle_agree() {
        let origin = Equatorial::from_degrees(45.0, 30.0);
        let moved = origin.offset_by(Angle::from_degrees(60.0), Angle::from_arcminutes(5.0));

        assert_relative_eq!(
            origin.angular_distance(&moved).as_arcminutes(),
            5.0,
            epsilon = 1e-9
        );
        assert_relative_eq!(
            origin.position_angle(&moved).as_degrees(),
            60.0,
            epsilon = 1e-6
        );
    }

    #[test]
    fn test_offset_due_north() {
        let origin = Equatorial::from_degrees(200.0, 10.0);
        let moved = origin.offset_by(Angle::from_degrees(0.0), Angle::from_degrees(1.0));
        assert_relative_eq!(moved.ra_degrees(), 200.0, epsilon = 1e-9);
        assert_relative_eq!(moved.dec_degrees(), 11.0, epsilon = 1e-9);
    }

    #[test]
    fn test_proper_motion_propagation() {
        let pos = Equatorial::from_degrees(10.0, 20.0);
        // 100 mas/yr due north for 10 years is one arcsecond
        let moved = pos.propagate_proper_motion(0.0, 100.0, 10.0);
        assert_relative_eq!(pos.angular_distance_mas(&moved), 1000.0, epsilon = 1e-6);
        assert!(moved.dec > pos.dec);

        // Backwards in time reverses the direction
        let earlier = pos.propagate_proper_motion(0.0, 100.0, -10.0);
        assert!(earlier.dec < pos.dec);

        let still = pos.propagate_proper_motion(0.0, 0.0, 25.0);
        assert_eq!(still, pos);
    }

    #[test]
    fn test_chord_conversions() {
        let angle = Angle::from_arcseconds(3.0);
        let chord = chord_for_angle(angle);
        assert_relative_eq!(angle_for_chord(chord).as_arcseconds(), 3.0, epsilon = 1e-9);
        assert_relative_eq!(chord_for_angle(Angle::from_degrees(180.0)), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_mas_radian_conversion() {
        assert_relative_eq!(radians_to_mas(mas_to_radians(42.0)), 42.0, epsilon = 1e-9);
    }
}
