//! Write a seeded measured/reference catalog pair for dry runs

use anyhow::Context;
use clap::Parser;
use log::info;
use shared::range_arg::MagnitudeRange;
use shared::synthetic::{observe, reference_field, FieldConfig, ObservationModel};
use shared::units::{Angle, AngleExt};
use shared::Equatorial;
use std::path::PathBuf;
use verify::VerifyConfig;

/// Parse field center in format "ra,dec" (degrees)
fn parse_center(s: &str) -> Result<Equatorial, String> {
    let parts: Vec<&str> = s.split(',').collect();
    if parts.len() != 2 {
        return Err("Center must be in format 'ra,dec'".to_string());
    }

    let ra = parts[0]
        .trim()
        .parse::<f64>()
        .map_err(|_| "Invalid RA value".to_string())?;
    let dec = parts[1]
        .trim()
        .parse::<f64>()
        .map_err(|_| "Invalid Dec value".to_string())?;

    Equatorial::try_from_degrees(ra, dec).map_err(|e| e.to_string())
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Generate synthetic catalogs for verification dry runs")]
struct Args {
    /// Directory receiving measured.json, reference.json and verify.json
    #[arg(long, default_value = "synthetic")]
    output_dir: PathBuf,

    /// Field center in degrees (format: "ra,dec")
    #[arg(long, default_value = "150.0,2.2", value_parser = parse_center)]
    center: Equatorial,

    /// Field radius in arcminutes
    #[arg(long, default_value_t = 30.0)]
    radius: f64,

    /// Number of reference sources
    #[arg(long, default_value_t = 2000)]
    num_sources: usize,

    /// Reference magnitude range (bright:faint)
    #[arg(long, default_value = "16:24")]
    magnitudes: MagnitudeRange,

    /// Per-axis astrometric scatter of the measured catalog in mas
    #[arg(long, default_value_t = 10.0)]
    sigma_mas: f64,

    /// Fraction of detections displaced by --outlier-offset
    #[arg(long, default_value_t = 0.0)]
    outlier_fraction: f64,

    /// Displacement of outlier detections in mas
    #[arg(long, default_value_t = 500.0)]
    outlier_offset: f64,

    /// Faintest detected reference magnitude
    #[arg(long, default_value_t = 23.5)]
    detection_limit: f64,

    /// Number of spurious detections
    #[arg(long, default_value_t = 0)]
    spurious: usize,

    /// Reference catalog epoch in Julian years
    #[arg(long, default_value_t = 2016.0)]
    epoch: f64,

    /// Random seed
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let field = FieldConfig {
        center: args.center,
        radius: Angle::from_arcminutes(args.radius),
        num_sources: args.num_sources,
        magnitudes: args.magnitudes,
        epoch: args.epoch,
        seed: args.seed,
    };
    let model = ObservationModel {
        astrometric_sigma_mas: args.sigma_mas,
        outlier_fraction: args.outlier_fraction,
        outlier_offset_mas: args.outlier_offset,
        detection_limit: args.detection_limit,
        spurious_count: args.spurious,
        seed: args.seed.wrapping_add(1),
        ..ObservationModel::default()
    };

    let reference = reference_field(&field)?;
    let measured = observe(&reference, &field, &model)?.with_epoch(args.epoch);

    std::fs::create_dir_all(&args.output_dir).with_context(|| {
        format!("Failed to create output directory {}", args.output_dir.display())
    })?;
    let measured_path = args.output_dir.join("measured.json");
    let reference_path = args.output_dir.join("reference.json");
    let config_path = args.output_dir.join("verify.json");

    measured.save_json(&measured_path)?;
    reference.save_json(&reference_path)?;

    let config = VerifyConfig {
        dataset: format!("synthetic_seed{}", args.seed),
        ..VerifyConfig::default()
    };
    config.save_to_file(&config_path)?;

    info!(
        "wrote {} measured and {} reference sources to {}",
        measured.len(),
        reference.len(),
        args.output_dir.display()
    );
    println!(
        "verify_all --measured {} --reference {} --config {}",
        measured_path.display(),
        reference_path.display(),
        config_path.display()
    );
    Ok(())
}
