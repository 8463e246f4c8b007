//! Structured logging setup.
//!
//! Uses `tracing` with a `tracing-subscriber` registry. Output goes to an
//! optional log file, else to stderr, else nowhere: the interactive test
//! screen owns the terminal and must not be written over, so front ends
//! that draw full-screen pass [`LogTarget::FileOrDiscard`].
//!
//! `RUST_LOG` overrides the configured level.
//!
//! Field names used across the workspace: `eye`, `distance`, `level`,
//! `step`, `acuity`, `id`, `path`.

use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io;
use std::path::PathBuf;
use std::sync::OnceLock;
use thiserror::Error;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

static LOGGING_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Log line format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-oriented single-line output.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Level filter (trace, debug, info, warn, error, off).
    pub level: String,
    pub format: LogFormat,
    /// Append log lines to this file instead of stderr.
    pub file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            level: "warn".to_string(),
            format: LogFormat::Pretty,
            file: None,
        }
    }
}

/// Where log lines go when no file is configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget {
    /// File if configured, stderr otherwise.
    FileOrStderr,
    /// File if configured, dropped otherwise.
    FileOrDiscard,
}

#[derive(Debug, Error)]
pub enum LogError {
    #[error("logging already initialized")]
    AlreadyInitialized,

    #[error("invalid log level filter {0:?}")]
    InvalidLevel(String),

    #[error("failed to open log file: {0}")]
    FileCreate(#[from] io::Error),

    #[error("failed to set global subscriber: {0}")]
    SetSubscriber(#[from] tracing_subscriber::util::TryInitError),
}

/// Install the global subscriber. Call once at startup.
pub fn init_logging(config: &LogConfig, target: LogTarget) -> Result<(), LogError> {
    if LOGGING_INITIALIZED.get().is_some() {
        return Err(LogError::AlreadyInitialized);
    }

    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level)
            .map_err(|_| LogError::InvalidLevel(config.level.clone()))?,
    };

    let writer = match (&config.file, target) {
        (Some(path), _) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            fmt::writer::BoxMakeWriter::new(std::sync::Mutex::new(file))
        }
        (None, LogTarget::FileOrStderr) => fmt::writer::BoxMakeWriter::new(io::stderr),
        (None, LogTarget::FileOrDiscard) => fmt::writer::BoxMakeWriter::new(io::sink),
    };
    let ansi = config.file.is_none() && target == LogTarget::FileOrStderr;

    match config.format {
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_writer(writer)
                    .with_target(true)
                    .with_ansi(ansi),
            )
            .try_init()?,
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(writer))
            .try_init()?,
    }

    let _ = LOGGING_INITIALIZED.set(());
    Ok(())
}
