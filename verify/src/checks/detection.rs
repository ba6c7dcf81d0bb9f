use super::{enough, Check, CheckInputs, CheckOutcome};
use crate::config::VerifyConfig;
use crate::error::VerifyError;
use crate::metrics::Measurement;
use crate::requirement::Requirement;
use log::info;
use shared::algo::has_counterpart;
use shared::range_arg::MagnitudeRange;
use shared::units::Angle;
use shared::SourceCatalog;

/// Fraction of `queries` with a `targets` source within `radius`
fn counterpart_fraction(
    queries: &SourceCatalog,
    targets: &SourceCatalog,
    radius: Angle,
) -> (usize, f64) {
    let found = has_counterpart(&queries.positions(), &targets.positions(), radius);
    let hits = found.iter().filter(|f| **f).count();
    (hits, hits as f64 / found.len() as f64)
}

/// Detections with no real source behind them.
///
/// The reference catalog is expected to be deeper than the measured one, so
/// a measured source in the magnitude range with nothing in the reference
/// within the match radius is counted as spurious.
#[derive(Debug, Clone)]
pub struct FalsePositives {
    pub match_radius: Angle,
    pub magnitude_range: MagnitudeRange,
    pub min_sources: usize,
    pub rate: Requirement,
}

impl FalsePositives {
    pub const NAME: &'static str = "false_positives";

    pub fn from_config(config: &VerifyConfig) -> Self {
        Self {
            match_radius: config.match_radius(),
            magnitude_range: config.magnitude_range,
            min_sources: config.min_matches,
            rate: Requirement::at_most(
                "false_positive_rate",
                "fraction of detections without a reference counterpart",
                config.detection.false_positive_rate_max,
                "",
            ),
        }
    }
}

impl Check for FalsePositives {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn run(&self, inputs: &CheckInputs<'_>) -> Result<CheckOutcome, VerifyError> {
        let candidates = inputs.measured.in_magnitude_range(&self.magnitude_range);
        let count = candidates.len();
        let mut measurements = vec![Measurement::info(
            "false_positive_candidates",
            Some(count as f64),
            "count",
        )];

        if !enough(Self::NAME, "detections in range", count, self.min_sources) {
            measurements.push(Measurement::checked(self.rate.clone(), None));
            return Ok(CheckOutcome::new(Self::NAME, measurements));
        }

        let (matched, matched_fraction) =
            counterpart_fraction(&candidates, inputs.reference, self.match_radius);
        let spurious = count - matched;
        info!(
            "{}: {spurious} of {count} detections in {} have no reference counterpart",
            Self::NAME,
            self.magnitude_range
        );

        measurements.push(Measurement::info(
            "false_positive_count",
            Some(spurious as f64),
            "count",
        ));
        measurements.push(Measurement::checked(self.rate.clone(), Some(1.0 - matched_fraction)));
        Ok(CheckOutcome::new(Self::NAME, measurements))
    }
}

/// Fraction of reference sources that were detected
#[derive(Debug, Clone)]
pub struct Completeness {
    pub match_radius: Angle,
    pub magnitude_range: MagnitudeRange,
    pub min_sources: usize,
    pub fraction: Requirement,
}

impl Completeness {
    pub const NAME: &'static str = "completeness";

    pub fn from_config(config: &VerifyConfig) -> Self {
        Self {
            match_radius: config.match_radius(),
            magnitude_range: config.magnitude_range,
            min_sources: config.min_matches,
            fraction: Requirement::at_least(
                "completeness",
                "fraction of reference sources with a detection",
                config.detection.completeness_min,
                "",
            ),
        }
    }
}

impl Check for Completeness {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn run(&self, inputs: &CheckInputs<'_>) -> Result<CheckOutcome, VerifyError> {
        let truth = inputs.reference.in_magnitude_range(&self.magnitude_range);
        let count = truth.len();
        let mut measurements = vec![Measurement::info(
            "completeness_reference_sources",
            Some(count as f64),
            "count",
        )];

        if !enough(Self::NAME, "reference sources in range", count, self.min_sources) {
            measurements.push(Measurement::checked(self.fraction.clone(), None));
            return Ok(CheckOutcome::new(Self::NAME, measurements));
        }

        let (detected, fraction) = counterpart_fraction(&truth, inputs.measured, self.match_radius);
        info!(
            "{}: {detected} of {count} reference sources in {} detected",
            Self::NAME,
            self.magnitude_range
        );

        measurements.push(Measurement::checked(self.fraction.clone(), Some(fraction)));
        Ok(CheckOutcome::new(Self::NAME, measurements))
    }
}
