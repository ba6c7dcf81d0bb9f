//! Type-safe range arguments for source selection.
//!
//! Provides clap-compatible types for the magnitude windows and pair
//! separation bands that every verification check selects on.

use crate::algo::pairs::SeparationBand;
use crate::units::{Angle, AngleExt};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Split a "a:b" argument into two floats
fn parse_pair(s: &str, first: &str, second: &str) -> Result<(f64, f64), String> {
    let parts: Vec<&str> = s.split(':').collect();
    if parts.len() != 2 {
        return Err(format!("Range must be in format '{first}:{second}'"));
    }

    let a = parts[0]
        .trim()
        .parse::<f64>()
        .map_err(|_| format!("Invalid {first} value"))?;
    let b = parts[1]
        .trim()
        .parse::<f64>()
        .map_err(|_| format!("Invalid {second} value"))?;

    Ok((a, b))
}

/// Half-open magnitude window `[bright, faint)`.
///
/// Astronomical magnitudes grow toward fainter sources, so `bright` is the
/// numerically smaller bound. Parsed from "bright:faint", e.g. "17:21.5".
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MagnitudeRange {
    pub bright: f64,
    pub faint: f64,
}

impl MagnitudeRange {
    /// Validated constructor
    pub fn new(bright: f64, faint: f64) -> Result<Self, String> {
        if !bright.is_finite() || !faint.is_finite() {
            return Err("Magnitude limits must be finite".to_string());
        }
        if bright >= faint {
            return Err(format!(
                "Bright limit {bright} must be smaller than faint limit {faint}"
            ));
        }
        Ok(Self { bright, faint })
    }

    pub fn contains(&self, mag: f64) -> bool {
        mag >= self.bright && mag < self.faint
    }
}

impl FromStr for MagnitudeRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (bright, faint) = parse_pair(s, "bright", "faint")?;
        Self::new(bright, faint)
    }
}

impl fmt::Display for MagnitudeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.bright, self.faint)
    }
}

/// Command-line form of a [`SeparationBand`]: "center:half_width" in arcminutes
#[derive(Debug, Clone, Copy)]
pub struct SeparationBandArg(pub SeparationBand);

impl FromStr for SeparationBandArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (center, half_width) = parse_pair(s, "center", "half_width")?;
        SeparationBand::new(
            Angle::from_arcminutes(center),
            Angle::from_arcminutes(half_width),
        )
        .map(SeparationBandArg)
    }
}

impl fmt::Display for SeparationBandArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}",
            self.0.center.as_arcminutes(),
            self.0.half_width.as_arcminutes()
        )
    }
}
