//! Verification configuration.
//!
//! Stored as JSON next to the data being verified. Every field has a
//! default, so a config file only needs the values it changes.

use serde::{Deserialize, Serialize};
use shared::algo::SeparationBand;
use shared::range_arg::MagnitudeRange;
use shared::units::{Angle, AngleExt};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to access config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Thresholds for matched-source separation from the reference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AbsoluteAstrometryConfig {
    /// Median separation must not exceed this (mas)
    pub median_max_mas: f64,
    /// Separations above this count as outliers (mas)
    pub outlier_threshold_mas: f64,
    pub outlier_fraction_max: f64,
}

impl Default for AbsoluteAstrometryConfig {
    fn default() -> Self {
        Self {
            median_max_mas: 50.0,
            outlier_threshold_mas: 100.0,
            outlier_fraction_max: 0.10,
        }
    }
}

/// One separation annulus of the relative astrometry check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandConfig {
    pub center_arcmin: f64,
    pub half_width_arcmin: f64,
    /// Median |pair separation error| must not exceed this (mas)
    pub median_max_mas: f64,
    pub outlier_threshold_mas: f64,
    pub outlier_fraction_max: f64,
}

impl BandConfig {
    pub fn band(&self) -> Result<SeparationBand, ConfigError> {
        SeparationBand::new(
            Angle::from_arcminutes(self.center_arcmin),
            Angle::from_arcminutes(self.half_width_arcmin),
        )
        .map_err(|e| ConfigError::Invalid(format!("band at {} arcmin: {e}", self.center_arcmin)))
    }

    /// Band with the thresholds of the default small-scale annulus
    pub fn with_default_thresholds(band: &SeparationBand) -> Self {
        Self {
            center_arcmin: band.center.as_arcminutes(),
            half_width_arcmin: band.half_width.as_arcminutes(),
            ..default_bands()[0].clone()
        }
    }
}

fn default_bands() -> Vec<BandConfig> {
    vec![
        BandConfig {
            center_arcmin: 5.0,
            half_width_arcmin: 1.0,
            median_max_mas: 10.0,
            outlier_threshold_mas: 20.0,
            outlier_fraction_max: 0.10,
        },
        BandConfig {
            center_arcmin: 20.0,
            half_width_arcmin: 2.0,
            median_max_mas: 10.0,
            outlier_threshold_mas: 20.0,
            outlier_fraction_max: 0.10,
        },
    ]
}

/// Thresholds for the detection checks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    pub false_positive_rate_max: f64,
    pub completeness_min: f64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            false_positive_rate_max: 0.05,
            completeness_min: 0.90,
        }
    }
}

/// Complete verification configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifyConfig {
    /// Label written into reports and metric bundles
    pub dataset: String,
    pub match_radius_arcsec: f64,
    pub magnitude_range: MagnitudeRange,
    /// Epoch (Julian years) the reference catalog is propagated to
    pub observation_epoch: Option<f64>,
    /// Statistics from fewer sources or pairs are reported as not computed
    pub min_matches: usize,
    pub max_pairs: usize,
    pub pair_seed: u64,
    pub absolute: AbsoluteAstrometryConfig,
    pub separation_bands: Vec<BandConfig>,
    pub detection: DetectionConfig,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            dataset: "unnamed".to_string(),
            match_radius_arcsec: 1.0,
            magnitude_range: MagnitudeRange {
                bright: 17.0,
                faint: 21.5,
            },
            observation_epoch: None,
            min_matches: 10,
            max_pairs: 2_000_000,
            pair_seed: 0,
            absolute: AbsoluteAstrometryConfig::default(),
            separation_bands: default_bands(),
            detection: DetectionConfig::default(),
        }
    }
}

impl VerifyConfig {
    pub fn match_radius(&self) -> Angle {
        Angle::from_arcseconds(self.match_radius_arcsec)
    }

    /// Reject values no check could run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.match_radius_arcsec.is_finite() && self.match_radius_arcsec > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "match radius must be positive, got {}",
                self.match_radius_arcsec
            )));
        }
        MagnitudeRange::new(self.magnitude_range.bright, self.magnitude_range.faint)
            .map_err(ConfigError::Invalid)?;
        if self.min_matches == 0 {
            return Err(ConfigError::Invalid("min_matches must be at least 1".to_string()));
        }
        if self.max_pairs == 0 {
            return Err(ConfigError::Invalid("max_pairs must be at least 1".to_string()));
        }
        let mut labels = HashSet::new();
        for band in &self.separation_bands {
            let label = band.band()?.label();
            if !labels.insert(label.clone()) {
                return Err(ConfigError::Invalid(format!("separation band {label} listed twice")));
            }
        }
        let fractions = [
            ("absolute.outlier_fraction_max", self.absolute.outlier_fraction_max),
            ("detection.false_positive_rate_max", self.detection.false_positive_rate_max),
            ("detection.completeness_min", self.detection.completeness_min),
        ];
        for (name, value) in fractions {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Invalid(format!("{name} must lie in [0, 1], got {value}")));
            }
        }
        Ok(())
    }

    /// Load and validate a JSON config
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = VerifyConfig::default();
        config.validate().unwrap();
        assert_eq!(config.separation_bands.len(), 2);
        assert_eq!(config.match_radius().as_arcseconds(), 1.0);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: VerifyConfig =
            serde_json::from_str(r#"{"dataset": "hsc_rc2", "absolute": {"median_max_mas": 30.0}}"#)
                .unwrap();
        assert_eq!(config.dataset, "hsc_rc2");
        assert_eq!(config.absolute.median_max_mas, 30.0);
        assert_eq!(config.absolute.outlier_threshold_mas, 100.0);
        assert_eq!(config.min_matches, 10);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = VerifyConfig {
            match_radius_arcsec: 0.0,
            ..VerifyConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        config.match_radius_arcsec = 1.0;
        config.detection.completeness_min = 1.5;
        assert!(config.validate().is_err());

        config.detection.completeness_min = 0.9;
        config.separation_bands[0].half_width_arcmin = 10.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_repeated_band_rejected() {
        let mut config = VerifyConfig::default();
        config.separation_bands.push(config.separation_bands[0].clone());
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        config.separation_bands[2].half_width_arcmin = 3.0;
        config.validate().unwrap();
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("verify.json");

        let config = VerifyConfig {
            dataset: "roundtrip".to_string(),
            observation_epoch: Some(2024.5),
            ..VerifyConfig::default()
        };
        config.save_to_file(&path).unwrap();
        assert_eq!(VerifyConfig::load_from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_load_missing_file() {
        let result = VerifyConfig::load_from_file(Path::new("/nonexistent/verify.json"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_band_from_arg_keeps_thresholds() {
        let band =
            SeparationBand::new(Angle::from_arcminutes(200.0), Angle::from_arcminutes(20.0)).unwrap();
        let config = BandConfig::with_default_thresholds(&band);
        assert_eq!(config.center_arcmin, 200.0);
        assert_eq!(config.median_max_mas, 10.0);
    }
}
