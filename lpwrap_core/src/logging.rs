//! Opt-in structured logging.
//!
//! The library only emits `tracing` events; nothing is printed unless a subscriber is
//! installed, either by the embedding application or through [`enable_logging`].

use std::env;
use std::io;

use thiserror::Error;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Environment variable read for the filter directive when no level is passed
pub const TRACE_ENV: &str = "LPWRAP_TRACE";
/// Environment variable selecting `pretty` or `json` output
pub const FORMAT_ENV: &str = "LPWRAP_LOG_FORMAT";

/// Errors raised while installing the subscriber
#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("Invalid log filter: {0}")]
    InvalidFilter(String),
    #[error("Invalid LPWRAP_LOG_FORMAT `{0}` (expected 'json' or 'pretty')")]
    InvalidFormat(String),
    #[error("Failed to initialize logging: {0}")]
    Init(String),
}

/// Install a global stderr subscriber.
///
/// When `level` is None, this reads `LPWRAP_TRACE` if set, otherwise logging stays `off`.
/// Returns `Ok(true)` when logging is initialized, `Ok(false)` if a subscriber is already
/// configured.
pub fn enable_logging(level: Option<&str>) -> Result<bool, LoggingError> {
    if tracing::dispatcher::has_been_set() {
        return Ok(false);
    }

    let level_value = level
        .map(str::to_string)
        .or_else(|| env::var(TRACE_ENV).ok())
        .unwrap_or_else(|| "off".to_string());
    let filter = build_filter(&level_value)?;

    let format = env::var(FORMAT_ENV).unwrap_or_else(|_| "pretty".to_string());
    if format.eq_ignore_ascii_case("json") {
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(io::stderr)
            .json();
        tracing_subscriber::registry()
            .with(filter)
            .with(layer)
            .try_init()
            .map_err(|err| LoggingError::Init(err.to_string()))?;
    } else if format.eq_ignore_ascii_case("pretty") {
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(io::stderr)
            .pretty();
        tracing_subscriber::registry()
            .with(filter)
            .with(layer)
            .try_init()
            .map_err(|err| LoggingError::Init(err.to_string()))?;
    } else {
        return Err(LoggingError::InvalidFormat(format));
    }
    Ok(true)
}

fn build_filter(level: &str) -> Result<EnvFilter, LoggingError> {
    if level.eq_ignore_ascii_case("off") {
        Ok(EnvFilter::default().add_directive(LevelFilter::OFF.into()))
    } else {
        EnvFilter::try_new(level).map_err(|err| LoggingError::InvalidFilter(err.to_string()))
    }
}
