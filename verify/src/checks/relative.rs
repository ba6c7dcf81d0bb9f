use super::{enough, match_in_magnitude_range, stats_error, Check, CheckInputs, CheckOutcome};
use crate::config::{BandConfig, VerifyConfig};
use crate::error::VerifyError;
use crate::metrics::Measurement;
use crate::requirement::Requirement;
use log::info;
use shared::algo::{median, outlier_fraction, pair_separation_errors, rms, SeparationBand};
use shared::range_arg::MagnitudeRange;
use shared::units::Angle;

/// Thresholds applied to the pairs of one separation band
#[derive(Debug, Clone)]
pub struct BandRequirements {
    pub band: SeparationBand,
    pub median: Requirement,
    pub outlier_threshold_mas: f64,
    pub outlier_fraction: Requirement,
}

impl BandRequirements {
    pub fn from_config(config: &BandConfig) -> Result<Self, VerifyError> {
        let band = config.band()?;
        let label = band.label();
        Ok(Self {
            band,
            median: Requirement::at_most(
                format!("rel_astrometry_median_{label}"),
                format!("median |pair separation error| for pairs {label} apart"),
                config.median_max_mas,
                "mas",
            ),
            outlier_threshold_mas: config.outlier_threshold_mas,
            outlier_fraction: Requirement::at_most(
                format!("rel_astrometry_outlier_fraction_{label}"),
                format!(
                    "fraction of {label} pairs with |error| above {} mas",
                    config.outlier_threshold_mas
                ),
                config.outlier_fraction_max,
                "",
            ),
        })
    }
}

/// Repeatability of separations between pairs of matched sources
#[derive(Debug, Clone)]
pub struct RelativeAstrometry {
    pub match_radius: Angle,
    pub magnitude_range: MagnitudeRange,
    /// Minimum number of pairs per band
    pub min_pairs: usize,
    pub max_pairs: usize,
    pub seed: u64,
    pub bands: Vec<BandRequirements>,
}

impl RelativeAstrometry {
    pub const NAME: &'static str = "relative_astrometry";

    pub fn from_config(config: &VerifyConfig) -> Result<Self, VerifyError> {
        let bands = config
            .separation_bands
            .iter()
            .map(BandRequirements::from_config)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            match_radius: config.match_radius(),
            magnitude_range: config.magnitude_range,
            min_pairs: config.min_matches,
            max_pairs: config.max_pairs,
            seed: config.pair_seed,
            bands,
        })
    }
}

impl Check for RelativeAstrometry {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn run(&self, inputs: &CheckInputs<'_>) -> Result<CheckOutcome, VerifyError> {
        let matched = match_in_magnitude_range(inputs, &self.magnitude_range, self.match_radius);
        let mut measurements = Vec::new();

        for band in &self.bands {
            let label = band.band.label();
            let errors = pair_separation_errors(
                &matched.result.pairs,
                &matched.measured,
                &matched.reference,
                &band.band,
                self.max_pairs,
                self.seed,
            );
            let count = errors.errors_mas.len();
            measurements.push(Measurement::info(
                format!("rel_astrometry_pairs_{label}"),
                Some(count as f64),
                "count",
            ));

            if !enough(Self::NAME, &format!("pairs at {label}"), count, self.min_pairs) {
                measurements.push(Measurement::checked(band.median.clone(), None));
                measurements.push(Measurement::checked(band.outlier_fraction.clone(), None));
                continue;
            }

            let abs_errors: Vec<f64> = errors.errors_mas.iter().map(|e| e.abs()).collect();
            let median_abs =
                median(&abs_errors).map_err(|e| stats_error(&band.median.name, e))?;
            let spread = rms(&errors.errors_mas)
                .map_err(|e| stats_error(&format!("rel_astrometry_rms_{label}"), e))?;
            let outliers = outlier_fraction(&errors.errors_mas, band.outlier_threshold_mas)
                .map_err(|e| stats_error(&band.outlier_fraction.name, e))?;

            info!(
                "{}: {count} pairs at {label} from {} sources{}, median |error| {:.2} mas",
                Self::NAME,
                errors.sources_used,
                if errors.subsampled { " (subsampled)" } else { "" },
                median_abs
            );

            measurements.push(Measurement::checked(band.median.clone(), Some(median_abs)));
            measurements.push(Measurement::info(
                format!("rel_astrometry_rms_{label}"),
                Some(spread),
                "mas",
            ));
            measurements.push(Measurement::checked(band.outlier_fraction.clone(), Some(outliers)));
        }

        Ok(CheckOutcome::new(Self::NAME, measurements))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::requirement::Verdict;
    use test_helpers::observed_field;

    fn run(sigma_mas: f64, num_sources: usize, seed: u64) -> CheckOutcome {
        let (measured, reference) = observed_field(num_sources, sigma_mas, 0, seed);
        let check = RelativeAstrometry::from_config(&VerifyConfig::default()).unwrap();
        check
            .run(&CheckInputs {
                measured: &measured,
                reference: &reference,
            })
            .unwrap()
    }

    fn verdict(outcome: &CheckOutcome, metric: &str) -> Option<Verdict> {
        outcome
            .measurements
            .iter()
            .find(|m| m.metric == metric)
            .and_then(|m| m.verdict)
    }

    #[test]
    fn test_bands_from_default_config() {
        let check = RelativeAstrometry::from_config(&VerifyConfig::default()).unwrap();
        let names: Vec<_> = check.bands.iter().map(|b| b.median.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["rel_astrometry_median_5pm1arcmin", "rel_astrometry_median_20pm2arcmin"]
        );
    }

    #[test]
    fn test_same_center_bands_get_distinct_metrics() {
        let mut config = VerifyConfig::default();
        config.separation_bands[1].center_arcmin = 5.0;
        config.separation_bands[1].half_width_arcmin = 3.0;
        config.validate().unwrap();

        let (measured, reference) = observed_field(300, 3.0, 0, 14);
        let outcome = RelativeAstrometry::from_config(&config)
            .unwrap()
            .run(&CheckInputs {
                measured: &measured,
                reference: &reference,
            })
            .unwrap();

        let mut names: Vec<&str> = outcome.measurements.iter().map(|m| m.metric.as_str()).collect();
        let total = names.len();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), total);
        assert!(names.contains(&"rel_astrometry_median_5pm3arcmin"));
    }

    #[test]
    fn test_precise_positions_pass() {
        let outcome = run(3.0, 500, 11);
        for label in ["5pm1arcmin", "20pm2arcmin"] {
            assert_eq!(
                verdict(&outcome, &format!("rel_astrometry_median_{label}")),
                Some(Verdict::Pass)
            );
            assert_eq!(
                verdict(&outcome, &format!("rel_astrometry_outlier_fraction_{label}")),
                Some(Verdict::Pass)
            );
        }
    }

    #[test]
    fn test_noisy_positions_fail() {
        let outcome = run(30.0, 500, 12);
        assert_eq!(
            verdict(&outcome, "rel_astrometry_median_5pm1arcmin"),
            Some(Verdict::Fail)
        );
        assert_eq!(
            verdict(&outcome, "rel_astrometry_outlier_fraction_5pm1arcmin"),
            Some(Verdict::Fail)
        );
    }

    #[test]
    fn test_sparse_field_is_not_computed() {
        let outcome = run(3.0, 4, 13);
        assert_eq!(
            verdict(&outcome, "rel_astrometry_median_5pm1arcmin"),
            Some(Verdict::NotComputed)
        );
        assert_eq!(
            verdict(&outcome, "rel_astrometry_median_20pm2arcmin"),
            Some(Verdict::NotComputed)
        );
    }
}
