use crate::config::{Config, TelemetryConfig};
use crate::transcription::Verbosity;
use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};
use tracing_subscriber::EnvFilter;

/// Initialize tracing; `RUST_LOG` overrides the verbosity-derived filter
///
/// # Errors
/// Returns error if the log file cannot be opened
pub fn init(config: &TelemetryConfig, verbosity: Verbosity) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));

    if !config.enabled {
        // Keep stdout clean; progress shares stderr
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .init();
        return Ok(());
    }

    let expanded_path = Config::expand_path(&config.log_path)?;

    // Create parent directory if needed
    if let Some(parent) = expanded_path.parent() {
        fs::create_dir_all(parent).context("failed to create log directory")?;
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&expanded_path)
        .context("failed to open log file")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(file)
        .with_target(false)
        .with_ansi(false)
        .init();

    tracing::info!("telemetry initialized: {}", expanded_path.display());

    Ok(())
}

const fn default_directive(verbosity: Verbosity) -> &'static str {
    match verbosity {
        Verbosity::Normal => "warn",
        Verbosity::Verbose => "info",
        Verbosity::Trace => "debug",
    }
}
