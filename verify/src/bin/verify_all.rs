//! Run every verification check against a measured catalog

use anyhow::Context;
use clap::Parser;
use log::info;
use std::path::PathBuf;
use verify::cli::{run_verification, CommonArgs};
use verify::runner::CheckSet;

#[derive(Parser, Debug)]
#[command(author, version, about = "Run all astrometry and detection checks")]
struct Args {
    #[command(flatten)]
    common: CommonArgs,

    /// Save the effective configuration (file plus overrides) to this path
    #[arg(long)]
    save_config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = args
        .common
        .resolve_config()
        .context("Failed to resolve configuration")?;

    if let Some(path) = &args.save_config {
        config
            .save_to_file(path)
            .with_context(|| format!("Failed to save configuration to {}", path.display()))?;
        info!("effective configuration saved to {}", path.display());
    }

    if !run_verification(&args.common, &config, CheckSet::All)? {
        std::process::exit(1);
    }
    Ok(())
}
