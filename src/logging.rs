use std::fs::{self, OpenOptions};

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{Registry, fmt};

use crate::config::LoggingConfig;

const LOG_ENV: &str = "FLOW_LOG";

/// Where log records go for this run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget {
    /// The terminal belongs to the UI: log to the configured file only.
    Interactive,
    /// One-shot mode: stderr unless a file is configured.
    Stderr,
}

/// Installs the global subscriber. Keep the returned guard alive until exit so
/// buffered file output is flushed.
pub fn init(config: &LoggingConfig, target: LogTarget) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(&config.level))
        .with_context(|| format!("invalid log level '{}'", config.level))?;

    if let Some(path) = &config.file {
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("failed to open log file {}", path.display()))?;
        let (writer, guard) = tracing_appender::non_blocking(file);

        Registry::default()
            .with(filter)
            .with(
                fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false)
                    .with_target(true),
            )
            .try_init()
            .context("failed to install log subscriber")?;
        tracing::debug!(path = %path.display(), "file logging enabled");
        return Ok(Some(guard));
    }

    if target == LogTarget::Stderr {
        Registry::default()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
            .try_init()
            .context("failed to install log subscriber")?;
    }

    Ok(None)
}
