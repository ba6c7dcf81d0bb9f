//! Check absolute and relative astrometry of a measured catalog

use anyhow::Context;
use clap::Parser;
use verify::cli::{run_verification, CommonArgs};
use verify::runner::CheckSet;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Check absolute and relative astrometry against a reference catalog"
)]
struct Args {
    #[command(flatten)]
    common: CommonArgs,

    /// Cap on source pairs per band before the matched set is subsampled
    #[arg(long)]
    max_pairs: Option<usize>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = args
        .common
        .resolve_config()
        .context("Failed to resolve configuration")?;
    if let Some(max_pairs) = args.max_pairs {
        config.max_pairs = max_pairs;
        config.validate()?;
    }

    if !run_verification(&args.common, &config, CheckSet::Astrometry)? {
        std::process::exit(1);
    }
    Ok(())
}
