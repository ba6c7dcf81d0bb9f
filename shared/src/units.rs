//! Type-safe angular units for astrometric measurements
//!
//! Separations in this workspace span from sub-milliarcsecond residuals to
//! degree-scale pair distances, so they are carried as `uom` angles and
//! converted only at the edges (file I/O, reports).

use uom::si::angle::{degree, radian, second};

/// Type alias for plane angles
pub type Angle = uom::si::f64::Angle;

/// Milliarcseconds per arcsecond
const MAS_PER_ARCSEC: f64 = 1000.0;

/// Arcseconds per arcminute
const ARCSEC_PER_ARCMIN: f64 = 60.0;

/// Extension trait for the angle conversions used in astrometry
pub trait AngleExt {
    /// Create angle from degrees
    fn from_degrees(deg: f64) -> Self;

    /// Get angle in degrees
    fn as_degrees(&self) -> f64;

    /// Create angle from radians
    fn from_radians(rad: f64) -> Self;

    /// Get angle in radians
    fn as_radians(&self) -> f64;

    /// Create angle from arcminutes
    fn from_arcminutes(arcmin: f64) -> Self;

    /// Get angle in arcminutes
    fn as_arcminutes(&self) -> f64;

    /// Create angle from arcseconds
    fn from_arcseconds(arcsec: f64) -> Self;

    /// Get angle in arcseconds
    fn as_arcseconds(&self) -> f64;

    /// Create angle from milliarcseconds
    fn from_milliarcseconds(mas: f64) -> Self;

    /// Get angle in milliarcseconds
    fn as_milliarcseconds(&self) -> f64;
}

impl AngleExt for Angle {
    fn from_degrees(deg: f64) -> Self {
        Angle::new::<degree>(deg)
    }

    fn as_degrees(&self) -> f64 {
        self.get::<degree>()
    }

    fn from_radians(rad: f64) -> Self {
        Angle::new::<radian>(rad)
    }

    fn as_radians(&self) -> f64 {
        self.get::<radian>()
    }

    fn from_arcminutes(arcmin: f64) -> Self {
        Angle::new::<second>(arcmin * ARCSEC_PER_ARCMIN)
    }

    fn as_arcminutes(&self) -> f64 {
        self.get::<second>() / ARCSEC_PER_ARCMIN
    }

    fn from_arcseconds(arcsec: f64) -> Self {
        Angle::new::<second>(arcsec)
    }

    fn as_arcseconds(&self) -> f64 {
        self.get::<second>()
    }

    fn from_milliarcseconds(mas: f64) -> Self {
        Angle::new::<second>(mas / MAS_PER_ARCSEC)
    }

    fn as_milliarcseconds(&self) -> f64 {
        self.get::<second>() * MAS_PER_ARCSEC
    }
}
