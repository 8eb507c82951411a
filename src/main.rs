//! Batch-decode every NOAA APT capture in the input directory with noaa-apt.

use anyhow::{Context, Result};
use apt_batch::{AppConfig, BatchOrchestrator, DecodeOptions};
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "apt-batch", version, about = "Decode a directory of NOAA APT captures with noaa-apt")]
struct Cli {
    /// Apply false color to the decoded images.
    #[arg(short = 'f', long = "false-color")]
    false_color: bool,

    /// Apply the map overlay onto the decoded images.
    #[arg(short = 'o', long)]
    overlay: bool,
}

impl From<&Cli> for DecodeOptions {
    fn from(cli: &Cli) -> Self {
        Self {
            false_color: cli.false_color,
            overlay: cli.overlay,
        }
    }
}

fn main() -> Result<()> {
    // Logs go to stderr so stdout carries only decode progress
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config_path = AppConfig::default_path();
    let config = AppConfig::load_or_default(&config_path)
        .with_context(|| format!("Failed to load configuration from {:?}", config_path))?;
    config.validate().context("Invalid configuration")?;

    let orchestrator = BatchOrchestrator::new(config);
    let stdout = std::io::stdout();
    let report = orchestrator
        .run(DecodeOptions::from(&cli), &mut stdout.lock())
        .context("Batch decode aborted")?;

    if !report.all_succeeded() {
        tracing::warn!("{}", report.summary_line());
    }

    Ok(())
}
