use super::{enough, match_in_magnitude_range, stats_error, Check, CheckInputs, CheckOutcome};
use crate::config::VerifyConfig;
use crate::error::VerifyError;
use crate::metrics::Measurement;
use crate::requirement::Requirement;
use log::info;
use shared::algo::{outlier_fraction, SummaryStats};
use shared::range_arg::MagnitudeRange;
use shared::units::Angle;

/// Separation of matched sources from their reference positions
#[derive(Debug, Clone)]
pub struct AbsoluteAstrometry {
    pub match_radius: Angle,
    pub magnitude_range: MagnitudeRange,
    pub min_matches: usize,
    pub median: Requirement,
    /// Separations above this count as outliers (mas)
    pub outlier_threshold_mas: f64,
    pub outlier_fraction: Requirement,
}

impl AbsoluteAstrometry {
    pub const NAME: &'static str = "absolute_astrometry";

    pub fn from_config(config: &VerifyConfig) -> Self {
        let abs = &config.absolute;
        Self {
            match_radius: config.match_radius(),
            magnitude_range: config.magnitude_range,
            min_matches: config.min_matches,
            median: Requirement::at_most(
                "abs_astrometry_median",
                "median separation of matched sources from the reference",
                abs.median_max_mas,
                "mas",
            ),
            outlier_threshold_mas: abs.outlier_threshold_mas,
            outlier_fraction: Requirement::at_most(
                "abs_astrometry_outlier_fraction",
                format!(
                    "fraction of matches separated by more than {} mas",
                    abs.outlier_threshold_mas
                ),
                abs.outlier_fraction_max,
                "",
            ),
        }
    }
}

impl Check for AbsoluteAstrometry {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn run(&self, inputs: &CheckInputs<'_>) -> Result<CheckOutcome, VerifyError> {
        let matched = match_in_magnitude_range(inputs, &self.magnitude_range, self.match_radius);
        let separations = matched.result.separations_mas();
        let count = separations.len();

        let mut measurements = vec![Measurement::info(
            "abs_astrometry_matches",
            Some(count as f64),
            "count",
        )];

        if !enough(Self::NAME, "matches", count, self.min_matches) {
            measurements.push(Measurement::checked(self.median.clone(), None));
            measurements.push(Measurement::checked(self.outlier_fraction.clone(), None));
            return Ok(CheckOutcome::new(Self::NAME, measurements));
        }

        let summary = SummaryStats::from_values(&separations)
            .map_err(|e| stats_error("abs_astrometry_median", e))?;
        let outliers = outlier_fraction(&separations, self.outlier_threshold_mas)
            .map_err(|e| stats_error("abs_astrometry_outlier_fraction", e))?;

        info!(
            "{}: {count} matches in {}, median {:.2} mas, rms {:.2} mas, {:.1}% beyond {} mas",
            Self::NAME,
            self.magnitude_range,
            summary.median,
            summary.rms,
            outliers * 100.0,
            self.outlier_threshold_mas
        );

        measurements.push(Measurement::checked(self.median.clone(), Some(summary.median)));
        measurements.push(Measurement::info("abs_astrometry_rms", Some(summary.rms), "mas"));
        measurements.push(Measurement::info("abs_astrometry_p68", Some(summary.p68), "mas"));
        measurements.push(Measurement::checked(self.outlier_fraction.clone(), Some(outliers)));

        Ok(CheckOutcome::new(Self::NAME, measurements))
    }
}
