//! Logging bootstrap for applications embedding the workspace crates.
//!
//! Library code only emits `tracing` events; installing a subscriber is the
//! embedder's choice. This module offers a ready-made one with env-filter
//! level control and a pretty or JSON output format.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;
use tracing_subscriber::{filter::EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

static INSTALLED: AtomicBool = AtomicBool::new(false);

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable output for terminals.
    Pretty,
    /// Structured JSON lines for log aggregation.
    Json,
}

/// Base verbosity, overridable per target through `filter`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn as_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Configuration for [`init_logging`].
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: LogLevel,
    pub format: LogFormat,
    /// Full env-filter directive string; overrides `level` when set.
    pub filter: Option<String>,
    /// Include the event's module path in output.
    pub display_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Pretty,
            filter: None,
            display_target: true,
        }
    }
}

/// Failures installing the subscriber.
#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("invalid log filter: {0}")]
    InvalidFilter(String),

    #[error("failed to install subscriber: {0}")]
    Install(String),
}

fn build_filter(config: &LoggingConfig) -> Result<EnvFilter, LoggingError> {
    let directives = config
        .filter
        .clone()
        .unwrap_or_else(|| config.level.as_str().to_string());
    EnvFilter::try_new(directives).map_err(|e| LoggingError::InvalidFilter(e.to_string()))
}

/// Install the global `tracing` subscriber.
///
/// Safe to call more than once: after the first successful install, later
/// calls are no-ops returning `Ok`.
pub fn init_logging(config: LoggingConfig) -> Result<(), LoggingError> {
    if INSTALLED.swap(true, Ordering::SeqCst) {
        return Ok(());
    }

    let filter = build_filter(&config)?;
    let result = match config.format {
        LogFormat::Pretty => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .pretty()
                .with_target(config.display_target)
                .with_writer(io::stdout);
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt_layer)
                .try_init()
        }
        LogFormat::Json => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .json()
                .with_target(config.display_target)
                .with_writer(io::stdout);
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt_layer)
                .try_init()
        }
    };

    result.map_err(|e| {
        INSTALLED.store(false, Ordering::SeqCst);
        LoggingError::Install(e.to_string())
    })
}
