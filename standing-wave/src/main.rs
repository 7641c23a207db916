use anyhow::Result;
use clap::Parser;
use standing_wave::{Config, Simulation};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Render a J0 standing wave as a looping GIF plus one high-resolution snapshot
#[derive(Parser)]
#[command(name = "standing-wave")]
#[command(version, about, long_about = None)]
struct Cli {
    /// TOML file overriding the built-in parameters
    config: Option<PathBuf>,

    /// Log per-frame progress
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

fn setup_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose, cli.quiet);

    // Compiled-in parameters unless a TOML file is given
    let config = match &cli.config {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            Config::from_file(path)?
        }
        None => Config::default(),
    };
    config.log_summary();

    let sim = Simulation::new(config)?;
    let summary = sim.run_with_visualisation()?;

    match &summary.snapshot {
        Some(snapshot) => info!(
            "Done: {} animation frames, snapshot of t={:.2} at {}",
            summary.frames_written,
            snapshot.time,
            snapshot.path.display()
        ),
        None => info!(
            "Done: {} animation frames, no sample reached the snapshot time",
            summary.frames_written
        ),
    }
    Ok(())
}
