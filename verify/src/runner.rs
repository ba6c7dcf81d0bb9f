//! Loading inputs and running a set of checks over them.

use crate::checks::{
    AbsoluteAstrometry, Check, CheckInputs, Completeness, FalsePositives, RelativeAstrometry,
};
use crate::config::VerifyConfig;
use crate::error::VerifyError;
use crate::metrics::MetricBundle;
use log::info;
use shared::SourceCatalog;
use std::path::Path;

/// Which group of checks a binary runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckSet {
    Astrometry,
    Detection,
    All,
}

/// Load both catalogs and bring the reference to the observation epoch
pub fn prepare_inputs(
    measured: &Path,
    reference: &Path,
    config: &VerifyConfig,
) -> Result<(SourceCatalog, SourceCatalog), VerifyError> {
    let measured = SourceCatalog::load(measured)?;
    let mut reference = SourceCatalog::load(reference)?;
    info!(
        "loaded {} measured and {} reference sources",
        measured.len(),
        reference.len()
    );

    if let Some(epoch) = config.observation_epoch.or(measured.epoch) {
        reference = reference.propagated_to(epoch);
    }
    Ok((measured, reference))
}

pub fn checks_from_config(
    config: &VerifyConfig,
    set: CheckSet,
) -> Result<Vec<Box<dyn Check>>, VerifyError> {
    let mut checks: Vec<Box<dyn Check>> = Vec::new();
    if matches!(set, CheckSet::Astrometry | CheckSet::All) {
        checks.push(Box::new(AbsoluteAstrometry::from_config(config)));
        checks.push(Box::new(RelativeAstrometry::from_config(config)?));
    }
    if matches!(set, CheckSet::Detection | CheckSet::All) {
        checks.push(Box::new(FalsePositives::from_config(config)));
        checks.push(Box::new(Completeness::from_config(config)));
    }
    Ok(checks)
}

/// Run every check and collect the measurements into one bundle
pub fn run_checks(
    checks: &[Box<dyn Check>],
    inputs: &CheckInputs<'_>,
    dataset: &str,
) -> Result<MetricBundle, VerifyError> {
    let mut bundle = MetricBundle::new(dataset);
    for check in checks {
        info!("running {}", check.name());
        let outcome = check.run(inputs)?;
        bundle.extend(outcome.measurements);
    }
    Ok(bundle)
}
