//! Synthetic catalogs for dry runs and tests.
//!
//! A reference field is drawn uniformly over a spherical cap; an observed
//! catalog is then derived from it by applying Gaussian astrometric
//! scatter, a fraction of gross outliers, a detection limit and some
//! spurious detections. Every draw is seeded so results are reproducible.

use crate::catalog::{Source, SourceCatalog};
use crate::range_arg::MagnitudeRange;
use crate::sky::Equatorial;
use crate::units::{Angle, AngleExt};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use thiserror::Error;

/// Ids of spurious detections start here so they never collide with real ones
pub const SPURIOUS_ID_OFFSET: u64 = 1_000_000_000;

#[derive(Error, Debug)]
pub enum SyntheticError {
    #[error("invalid synthetic parameter: {0}")]
    InvalidParameter(String),
}

/// Where and how many reference sources to draw
#[derive(Debug, Clone)]
pub struct FieldConfig {
    pub center: Equatorial,
    pub radius: Angle,
    pub num_sources: usize,
    pub magnitudes: MagnitudeRange,
    pub epoch: f64,
    pub seed: u64,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            center: Equatorial::from_degrees(150.0, 2.2),
            radius: Angle::from_arcminutes(30.0),
            num_sources: 2000,
            magnitudes: MagnitudeRange {
                bright: 16.0,
                faint: 24.0,
            },
            epoch: 2016.0,
            seed: 42,
        }
    }
}

/// How the observed catalog departs from the reference
#[derive(Debug, Clone)]
pub struct ObservationModel {
    /// Per-axis Gaussian position scatter
    pub astrometric_sigma_mas: f64,
    /// Fraction of detections displaced by `outlier_offset_mas`
    pub outlier_fraction: f64,
    pub outlier_offset_mas: f64,
    /// Reference sources fainter than this are not detected
    pub detection_limit: f64,
    /// Number of detections with no real counterpart
    pub spurious_count: usize,
    pub photometric_sigma: f64,
    pub seed: u64,
}

impl Default for ObservationModel {
    fn default() -> Self {
        Self {
            astrometric_sigma_mas: 10.0,
            outlier_fraction: 0.0,
            outlier_offset_mas: 500.0,
            detection_limit: 23.5,
            spurious_count: 0,
            photometric_sigma: 0.02,
            seed: 7,
        }
    }
}

/// Uniformly distributed point inside a spherical cap
fn random_point_in_cap(rng: &mut ChaCha8Rng, center: &Equatorial, radius: Angle) -> Equatorial {
    let cos_max = radius.as_radians().cos();
    let cos_theta = rng.gen_range(cos_max..=1.0);
    let separation = Angle::from_radians(cos_theta.clamp(-1.0, 1.0).acos());
    let position_angle = Angle::from_degrees(rng.gen_range(0.0..360.0));
    center.offset_by(position_angle, separation)
}

/// Draw a reference catalog
pub fn reference_field(config: &FieldConfig) -> Result<SourceCatalog, SyntheticError> {
    let radius = config.radius.as_radians();
    if !(radius > 0.0 && radius <= std::f64::consts::PI) {
        return Err(SyntheticError::InvalidParameter(format!(
            "field radius {radius} rad must lie in (0, pi]"
        )));
    }

    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let sources = (0..config.num_sources)
        .map(|i| {
            let position = random_point_in_cap(&mut rng, &config.center, config.radius);
            let mag = rng.gen_range(config.magnitudes.bright..config.magnitudes.faint);
            Source::new(i as u64 + 1, position).with_mag(mag)
        })
        .collect();

    Ok(SourceCatalog::new("synthetic_reference", sources).with_epoch(config.epoch))
}

/// Derive an observed catalog from `reference`
pub fn observe(
    reference: &SourceCatalog,
    field: &FieldConfig,
    model: &ObservationModel,
) -> Result<SourceCatalog, SyntheticError> {
    if !(0.0..=1.0).contains(&model.outlier_fraction) {
        return Err(SyntheticError::InvalidParameter(format!(
            "outlier fraction {} must lie in [0, 1]",
            model.outlier_fraction
        )));
    }
    let scatter = Normal::new(0.0, model.astrometric_sigma_mas)
        .map_err(|e| SyntheticError::InvalidParameter(format!("astrometric sigma: {e}")))?;
    let photometry = Normal::new(0.0, model.photometric_sigma)
        .map_err(|e| SyntheticError::InvalidParameter(format!("photometric sigma: {e}")))?;

    let mut rng = ChaCha8Rng::seed_from_u64(model.seed);
    let mut sources = Vec::with_capacity(reference.len() + model.spurious_count);

    for truth in reference.iter() {
        if truth.mag.is_some_and(|m| m >= model.detection_limit) {
            continue;
        }

        let (offset_mas, position_angle) = if rng.gen_bool(model.outlier_fraction) {
            (model.outlier_offset_mas, rng.gen_range(0.0..360.0))
        } else {
            let dx: f64 = scatter.sample(&mut rng);
            let dy: f64 = scatter.sample(&mut rng);
            (dx.hypot(dy), dx.atan2(dy).to_degrees())
        };

        let position = truth.position.offset_by(
            Angle::from_degrees(position_angle),
            Angle::from_milliarcseconds(offset_mas),
        );
        let mut source = Source::new(truth.id, position);
        source.mag = truth.mag.map(|m| m + photometry.sample(&mut rng));
        source.mag_err = truth.mag.map(|_| model.photometric_sigma);
        sources.push(source);
    }

    for i in 0..model.spurious_count {
        let position = random_point_in_cap(&mut rng, &field.center, field.radius);
        let mag = rng.gen_range(field.magnitudes.bright..model.detection_limit.max(field.magnitudes.bright + 0.1));
        sources.push(Source::new(SPURIOUS_ID_OFFSET + i as u64, position).with_mag(mag));
    }

    Ok(SourceCatalog::new("synthetic_observed", sources))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_field_stays_in_cap() {
        let config = FieldConfig {
            num_sources: 300,
            ..FieldConfig::default()
        };
        let catalog = reference_field(&config).unwrap();
        assert_eq!(catalog.len(), 300);
        assert_eq!(catalog.epoch, Some(2016.0));

        let limit = config.radius.as_radians() + 1e-12;
        for source in catalog.iter() {
            assert!(config.center.angular_distance_radians(&source.position) <= limit);
            let mag = source.mag.unwrap();
            assert!(config.magnitudes.contains(mag));
        }
    }

    #[test]
    fn test_reference_field_is_seeded() {
        let config = FieldConfig {
            num_sources: 50,
            ..FieldConfig::default()
        };
        assert_eq!(
            reference_field(&config).unwrap(),
            reference_field(&config).unwrap()
        );
    }

    #[test]
    fn test_reference_field_rejects_bad_radius() {
        let config = FieldConfig {
            radius: Angle::from_degrees(0.0),
            ..FieldConfig::default()
        };
        assert!(reference_field(&config).is_err());
    }

    #[test]
    fn test_observe_applies_limit_and_spurious() {
        let field = FieldConfig {
            num_sources: 500,
            ..FieldConfig::default()
        };
        let reference = reference_field(&field).unwrap();
        let model = ObservationModel {
            detection_limit: 22.0,
            spurious_count: 25,
            ..ObservationModel::default()
        };
        let observed = observe(&reference, &field, &model).unwrap();

        let detectable = reference.iter().filter(|s| s.mag.unwrap() < 22.0).count();
        assert_eq!(observed.len(), detectable + 25);

        let spurious = observed.iter().filter(|s| s.id >= SPURIOUS_ID_OFFSET).count();
        assert_eq!(spurious, 25);
    }

    #[test]
    fn test_observe_scatter_is_small() {
        let field = FieldConfig {
            num_sources: 200,
            ..FieldConfig::default()
        };
        let reference = reference_field(&field).unwrap();
        let model = ObservationModel {
            astrometric_sigma_mas: 5.0,
            detection_limit: 99.0,
            ..ObservationModel::default()
        };
        let observed = observe(&reference, &field, &model).unwrap();
        assert_eq!(observed.len(), reference.len());

        for (truth, seen) in reference.iter().zip(observed.iter()) {
            assert_eq!(truth.id, seen.id);
            // 10 sigma in the radial direction
            assert!(truth.position.angular_distance_mas(&seen.position) < 50.0);
        }
    }

    #[test]
    fn test_observe_rejects_bad_outlier_fraction() {
        let field = FieldConfig {
            num_sources: 5,
            ..FieldConfig::default()
        };
        let reference = reference_field(&field).unwrap();
        let model = ObservationModel {
            outlier_fraction: 1.5,
            ..ObservationModel::default()
        };
        assert!(observe(&reference, &field, &model).is_err());
    }
}
