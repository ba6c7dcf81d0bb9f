//! Command-line arguments shared by the verification binaries.

use crate::checks::CheckInputs;
use crate::config::{BandConfig, ConfigError, VerifyConfig};
use crate::metrics::MetricBundle;
use crate::report;
use crate::runner::{checks_from_config, prepare_inputs, run_checks, CheckSet};
use anyhow::Context;
use clap::Args;
use log::{info, warn};
use shared::range_arg::{MagnitudeRange, SeparationBandArg};
use std::path::PathBuf;

/// Inputs, config and overrides common to every verification binary
#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    /// Measured source catalog (.json or .csv)
    #[arg(long)]
    pub measured: PathBuf,

    /// Reference catalog (.json or .csv), usually deeper than the measured one
    #[arg(long)]
    pub reference: PathBuf,

    /// JSON config file; built-in defaults are used when omitted
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Write the metric bundle as JSON to this path
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Dataset label for the report and metric bundle
    #[arg(long)]
    pub dataset: Option<String>,

    /// Reference magnitude range (bright:faint)
    #[arg(long)]
    pub mag_range: Option<MagnitudeRange>,

    /// Match radius in arcseconds
    #[arg(long)]
    pub match_radius: Option<f64>,

    /// Observation epoch in Julian years; defaults to the measured catalog's epoch
    #[arg(long)]
    pub epoch: Option<f64>,

    /// Pair separation band (center:half_width, arcmin); repeat for several bands
    #[arg(long = "band")]
    pub bands: Vec<SeparationBandArg>,
}

impl CommonArgs {
    /// Config file (or defaults) with command-line overrides applied
    pub fn resolve_config(&self) -> Result<VerifyConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => VerifyConfig::load_from_file(path)?,
            None => VerifyConfig::default(),
        };

        if let Some(dataset) = &self.dataset {
            config.dataset = dataset.clone();
        }
        if let Some(range) = self.mag_range {
            config.magnitude_range = range;
        }
        if let Some(radius) = self.match_radius {
            config.match_radius_arcsec = radius;
        }
        if let Some(epoch) = self.epoch {
            config.observation_epoch = Some(epoch);
        }
        if !self.bands.is_empty() {
            config.separation_bands = self
                .bands
                .iter()
                .map(|b| BandConfig::with_default_thresholds(&b.0))
                .collect();
        }

        config.validate()?;
        Ok(config)
    }
}

/// Load, check, report and save. Returns whether every requirement passed.
pub fn run_verification(
    args: &CommonArgs,
    config: &VerifyConfig,
    set: CheckSet,
) -> anyhow::Result<bool> {
    let (measured, reference) = prepare_inputs(&args.measured, &args.reference, config)
        .context("Failed to load catalogs")?;

    let checks = checks_from_config(config, set)?;
    let inputs = CheckInputs {
        measured: &measured,
        reference: &reference,
    };
    let bundle = run_checks(&checks, &inputs, &config.dataset)?;

    print!("{}", report::render(&bundle));
    save_bundle(&bundle, args.output.as_ref())?;

    if bundle.all_passed() {
        info!("all requirements met for {}", config.dataset);
    } else {
        for failure in bundle.failures() {
            warn!("requirement not met: {}", failure.metric);
        }
    }
    Ok(bundle.all_passed())
}

fn save_bundle(bundle: &MetricBundle, output: Option<&PathBuf>) -> anyhow::Result<()> {
    if let Some(path) = output {
        bundle
            .save_to_file(path)
            .with_context(|| format!("Failed to write metric bundle to {}", path.display()))?;
        info!("metric bundle written to {}", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser, Debug)]
    struct TestCli {
        #[command(flatten)]
        common: CommonArgs,
    }

    fn parse(extra: &[&str]) -> CommonArgs {
        let mut argv = vec!["test", "--measured", "m.csv", "--reference", "r.csv"];
        argv.extend_from_slice(extra);
        TestCli::parse_from(argv).common
    }

    #[test]
    fn test_defaults_without_overrides() {
        let config = parse(&[]).resolve_config().unwrap();
        assert_eq!(config, VerifyConfig::default());
    }

    #[test]
    fn test_overrides_apply() {
        let args = parse(&[
            "--dataset",
            "cosmos",
            "--mag-range",
            "18:22",
            "--match-radius",
            "0.5",
            "--epoch",
            "2024.3",
            "--band",
            "200:20",
            "--band",
            "5:1",
        ]);
        let config = args.resolve_config().unwrap();
        assert_eq!(config.dataset, "cosmos");
        assert_eq!(config.magnitude_range, MagnitudeRange::new(18.0, 22.0).unwrap());
        assert_eq!(config.match_radius_arcsec, 0.5);
        assert_eq!(config.observation_epoch, Some(2024.3));
        assert_eq!(config.separation_bands.len(), 2);
        assert_eq!(config.separation_bands[0].center_arcmin, 200.0);
    }

    #[test]
    fn test_invalid_override_rejected() {
        let args = parse(&["--match-radius", "0"]);
        assert!(args.resolve_config().is_err());
    }

    #[test]
    fn test_bad_mag_range_rejected_by_parser() {
        let argv = ["test", "--measured", "m", "--reference", "r", "--mag-range", "22:18"];
        assert!(TestCli::try_parse_from(argv).is_err());
    }

    #[test]
    fn test_config_file_then_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("verify.json");
        std::fs::write(&path, r#"{"dataset": "from_file", "min_matches": 50}"#).unwrap();

        let path_arg = path.to_str().unwrap();
        let config = parse(&["--config", path_arg, "--dataset", "from_cli"])
            .resolve_config()
            .unwrap();
        assert_eq!(config.dataset, "from_cli");
        assert_eq!(config.min_matches, 50);
    }
}
