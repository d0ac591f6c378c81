//! Process bootstrap: parse the CLI, load config, connect, run the TUI.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use redscope::config::AppConfig;
use redscope::tui;
use redscope_scan::WorkerEngine;
use redscope_store::StoreClient;

const DEFAULT_CONFIG: &str = "config.toml";

#[derive(Parser, Debug)]
#[command(name = "redscope", about = "Terminal keyspace watcher for Redis")]
struct Cli {
    /// Configuration file
    #[arg(default_value = DEFAULT_CONFIG)]
    config: PathBuf,

    /// Enable verbose logging (info/debug to stderr)
    #[arg(short = 'v', long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(err) = redscope_logging::init_logging(redscope_logging::LogConfig {
        app_name: "redscope",
        verbose: cli.verbose,
        tui_mode: true,
    }) {
        eprintln!("logging setup failed: {err:#}");
        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %format!("{err:#}"), "startup failed");
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = AppConfig::load(&cli.config)?;

    let store = StoreClient::connect(&config.redis)
        .await
        .context("failed to connect to redis")?;

    info!(scans = config.scans.len(), "starting scan engine");
    let engine = WorkerEngine::new(config.scans, store.clone());

    tui::run(engine, store).await
}
