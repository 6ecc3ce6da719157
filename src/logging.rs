use crate::config::AppConfig;
use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt};

const LOG_FILE: &str = "treenav.log";

pub fn log_dir(config: &AppConfig) -> Result<PathBuf> {
    if let Some(dir) = &config.log_dir {
        return Ok(dir.clone());
    }
    let base = dirs::cache_dir().context("could not resolve cache directory")?;
    Ok(base.join("treenav"))
}

/// Installs the global file subscriber. The terminal belongs to the UI, so
/// nothing is written to stdout or stderr. Keep the guard alive until exit.
pub fn init(config: &AppConfig) -> Result<WorkerGuard> {
    let dir = log_dir(config)?;
    fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create log directory: {}", dir.display()))?;

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(LOG_FILE)
        .build(&dir)
        .context("failed to create log file appender")?;
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .context("invalid log level")?;

    fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .with_target(false)
        .try_init()
        .map_err(|err| anyhow::anyhow!("failed to install log subscriber: {err}"))?;

    Ok(guard)
}
