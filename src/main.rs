// src/main.rs

//! doughwatch CLI
//!
//! Polls the Pizza Index page on a fixed interval and alerts a Discord
//! webhook when DOUGHCON, store statuses, order activity, or the NEHI
//! change between readings.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use doughwatch::error::Result;
use doughwatch::models::Config;
use doughwatch::pipeline::Monitor;
use doughwatch::storage::{JsonStateStore, StateStore};

/// doughwatch - Pizza Index monitor
#[derive(Parser, Debug)]
#[command(name = "doughwatch", version, about = "Pizza Index change monitor")]
struct Cli {
    /// Path to the TOML config file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the polling loop until SIGINT/SIGTERM
    Run,

    /// Run a single fetch→detect→notify→persist cycle and exit
    Once,

    /// Send a test notification to verify the webhook
    Test,

    /// Show a summary of the persisted state
    Info,
}

/// Initialize logging from the verbosity flag and config level.
fn init_logging(verbose: bool, level: &str) {
    let level = if verbose { "debug" } else { level };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load_or_default(&cli.config);
    init_logging(cli.verbose, &config.logging.level);

    match cli.command {
        Command::Run => {
            let monitor = Monitor::new(&config).inspect_err(log_config_error)?;
            monitor.run().await?;
        }

        Command::Once => {
            let monitor = Monitor::new(&config).inspect_err(log_config_error)?;
            let outcome = monitor.tick().await?;
            log::info!(
                "Tick complete - DOUGHCON {}, {} event(s) detected, {} sent",
                outcome.snapshot.threat_level,
                outcome.events_detected,
                outcome.events_sent
            );
        }

        Command::Test => {
            let monitor = Monitor::new(&config).inspect_err(log_config_error)?;
            monitor.notifier().send_test().await?;
        }

        Command::Info => {
            let store = JsonStateStore::new(config.state.file.clone());
            match store.load().await? {
                Some(snapshot) => log::info!(
                    "DOUGHCON {} | {} stores | activity {} | captured {}",
                    snapshot.threat_level,
                    snapshot.store_count(),
                    snapshot.activity_count,
                    snapshot.captured_at.to_rfc3339()
                ),
                None => log::info!("No persisted state yet."),
            }
        }
    }

    Ok(())
}

fn log_config_error(e: &doughwatch::error::AppError) {
    log::error!("Configuration error: {}", e);
}
