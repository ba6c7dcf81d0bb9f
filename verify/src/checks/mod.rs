//! Verification checks.
//!
//! Each check takes the measured and reference catalogs, computes its
//! statistics and returns them as [`Measurement`]s, with a verdict for
//! every statistic that carries a requirement.

mod absolute;
mod detection;
mod relative;

pub use absolute::AbsoluteAstrometry;
pub use detection::{Completeness, FalsePositives};
pub use relative::{BandRequirements, RelativeAstrometry};

use crate::error::VerifyError;
use crate::metrics::Measurement;
use log::warn;
use shared::algo::{mutual_matches, MatchResult};
use shared::range_arg::MagnitudeRange;
use shared::units::Angle;
use shared::{Equatorial, SourceCatalog};

/// Catalogs a check runs on, already brought to a common epoch
#[derive(Debug, Clone, Copy)]
pub struct CheckInputs<'a> {
    pub measured: &'a SourceCatalog,
    pub reference: &'a SourceCatalog,
}

/// Measurements produced by one check
#[derive(Debug, Clone, PartialEq)]
pub struct CheckOutcome {
    pub check: String,
    pub measurements: Vec<Measurement>,
}

impl CheckOutcome {
    pub fn new(check: impl Into<String>, measurements: Vec<Measurement>) -> Self {
        Self {
            check: check.into(),
            measurements,
        }
    }
}

pub trait Check {
    fn name(&self) -> &str;

    fn run(&self, inputs: &CheckInputs<'_>) -> Result<CheckOutcome, VerifyError>;
}

/// Mutual matches between every measured source and the reference sources
/// in `range`, with the position lists the match indices refer to.
pub(crate) struct MagnitudeMatch {
    pub result: MatchResult,
    pub measured: Vec<Equatorial>,
    pub reference: Vec<Equatorial>,
}

/// Selection happens on reference magnitude so measured photometry errors
/// cannot move sources in or out of the sample.
pub(crate) fn match_in_magnitude_range(
    inputs: &CheckInputs<'_>,
    range: &MagnitudeRange,
    radius: Angle,
) -> MagnitudeMatch {
    let measured = inputs.measured.positions();
    let reference = inputs.reference.in_magnitude_range(range).positions();
    let result = mutual_matches(&measured, &reference, radius);
    MagnitudeMatch {
        result,
        measured,
        reference,
    }
}

/// Log and report whether `count` meets `min_count`
pub(crate) fn enough(check: &str, what: &str, count: usize, min_count: usize) -> bool {
    if count < min_count {
        warn!("{check}: only {count} {what} (need {min_count}); statistics not computed");
        false
    } else {
        true
    }
}

pub(crate) fn stats_error(metric: &str, source: shared::algo::StatsError) -> VerifyError {
    VerifyError::Stats {
        metric: metric.to_string(),
        source,
    }
}
