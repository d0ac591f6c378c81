//! Shared tracing setup for the redscope binary.
//!
//! Diagnostics go to a per-run file under the redscope home directory; the
//! stderr layer stays at `warn` while the TUI owns the terminal so log
//! lines never tear the alternate screen.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const DEFAULT_LOG_FILTER: &str = "redscope=info,redscope_scan=info,redscope_store=info";

/// Logging configuration for the binary.
pub struct LogConfig<'a> {
    pub app_name: &'a str,
    pub verbose: bool,
    /// True while the TUI owns the terminal.
    pub tui_mode: bool,
}

/// Initialize tracing with a per-run log file and a stderr layer.
pub fn init_logging(config: LogConfig<'_>) -> Result<()> {
    let log_dir = ensure_logs_dir().context("failed to create log directory")?;
    let file_name = format!(
        "{}-{}.log",
        config.app_name,
        chrono::Local::now().format("%Y%m%d-%H%M%S")
    );
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join(file_name))
        .context("failed to open log file")?;

    let file_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let console_filter = if config.verbose {
        EnvFilter::new(DEFAULT_LOG_FILTER)
    } else if config.tui_mode {
        EnvFilter::new("warn")
    } else {
        EnvFilter::new(DEFAULT_LOG_FILTER)
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Arc::new(file))
                .with_ansi(false)
                .with_filter(file_filter),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(console_filter),
        )
        .init();

    Ok(())
}

/// Get the redscope home directory: ~/.redscope (REDSCOPE_HOME overrides).
pub fn redscope_home() -> PathBuf {
    if let Ok(override_path) = std::env::var("REDSCOPE_HOME") {
        return PathBuf::from(override_path);
    }
    dirs::home_dir()
        .expect("Could not determine home directory")
        .join(".redscope")
}

/// Get the logs directory: ~/.redscope/logs
pub fn logs_dir() -> PathBuf {
    redscope_home().join("logs")
}

/// Ensure the logs directory exists.
pub fn ensure_logs_dir() -> Result<PathBuf> {
    let logs = logs_dir();
    fs::create_dir_all(&logs)
        .with_context(|| format!("failed to create logs directory: {}", logs.display()))?;
    Ok(logs)
}
