//! Check false-positive rate and completeness of a measured catalog

use anyhow::Context;
use clap::Parser;
use verify::cli::{run_verification, CommonArgs};
use verify::runner::CheckSet;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Check false-positive rate and completeness against a deeper reference catalog"
)]
struct Args {
    #[command(flatten)]
    common: CommonArgs,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = args
        .common
        .resolve_config()
        .context("Failed to resolve configuration")?;

    if !run_verification(&args.common, &config, CheckSet::Detection)? {
        std::process::exit(1);
    }
    Ok(())
}
