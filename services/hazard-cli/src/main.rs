//! Wind hazard computation service.
//!
//! Loads a windfield realization ensemble, fits a GEV distribution to
//! every grid cell, and writes the return-period wind-speed hazard store.

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use hazard_engine::{HazardConfig, HazardEngine};

#[derive(Parser, Debug)]
#[command(name = "hazard")]
#[command(about = "Return-period wind hazard grids from windfield ensembles")]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "hazard.yaml")]
    config: String,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    // Load configuration
    let raw = std::fs::read_to_string(&args.config)
        .with_context(|| format!("reading configuration file {}", args.config))?;
    let config: HazardConfig =
        serde_yaml::from_str(&raw).context("parsing configuration file")?;

    info!(
        nsim = config.num_simulations,
        input = %config.input_path.display(),
        output = %config.output_path.display(),
        "starting wind hazard computation"
    );

    let engine = HazardEngine::new(config).context("setting up hazard computation")?;
    info!(
        nx = engine.domain().nx(),
        ny = engine.domain().ny(),
        tiles = engine.num_tiles(),
        "domain derived from realization grid"
    );

    engine.run().context("hazard computation failed")?;
    info!("hazard computation complete");

    Ok(())
}
