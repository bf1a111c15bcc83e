//! # Tracing Setup
//!
//! Installs the process-wide `tracing` subscriber:
//! - an `EnvFilter` taken from `RUST_LOG`, falling back to the configured level,
//! - a human readable console layer,
//! - optionally a JSON file layer written through a daily rolling appender.
//!
//! The file writer is non-blocking; the returned `WorkerGuard` must be kept
//! alive until shutdown or buffered lines are lost.

use std::path::PathBuf;

use thiserror::Error;
use tracing_appender::{non_blocking, non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Errors raised while installing the subscriber.
#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("Failed to create log directory {path}: {source}")]
    LogDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid log filter '{directive}': {source}")]
    Filter {
        directive: String,
        #[source]
        source: tracing_subscriber::filter::ParseError,
    },
    #[error("A global tracing subscriber is already installed: {0}")]
    AlreadyInitialized(#[from] tracing_subscriber::util::TryInitError),
}

/// Where and how much to log.
#[derive(Debug, Clone)]
pub struct LogOptions {
    /// Prefix of the rolled log files (`<app_name>.log.YYYY-MM-DD`).
    pub app_name: String,
    /// Filter directive used when `RUST_LOG` is not set (e.g. `info`, `trot_results=debug`).
    pub level: String,
    /// Directory for JSON log files. `None` logs to the console only.
    pub log_dir: Option<PathBuf>,
}

impl Default for LogOptions {
    fn default() -> Self {
        Self {
            app_name: "app".to_string(),
            level: "info".to_string(),
            log_dir: None,
        }
    }
}

/// Installs the global subscriber described by `options`.
///
/// Returns the file writer guard when file logging is enabled.
pub fn init_tracing(options: &LogOptions) -> Result<Option<WorkerGuard>, LoggerError> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&options.level).map_err(|source| LoggerError::Filter {
            directive: options.level.clone(),
            source,
        })?,
    };

    let console_layer = fmt::layer().with_target(true).with_ansi(true);

    let (file_layer, guard) = match &options.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir).map_err(|source| LoggerError::LogDir {
                path: dir.clone(),
                source,
            })?;
            let file_appender = rolling::daily(dir, format!("{}.log", options.app_name));
            let (writer, guard) = non_blocking(file_appender);
            let layer = fmt::layer()
                .with_ansi(false)
                .with_writer(writer)
                .json();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()?;

    tracing::info!(level = %options.level, file_logging = guard.is_some(), "Logging initialized");
    Ok(guard)
}
