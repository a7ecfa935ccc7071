//! Tracing setup.
//!
//! - `LOG_LEVEL` overrides the configured filter (e.g. "debug" or
//!   "info,attraction_quiz=debug,reqwest=warn").
//! - `LOG_FORMAT` overrides the configured format, "pretty" or "json".
//!
//! The terminal is owned by the quiz UI, so logs are written to the
//! configured file. Without a file, no subscriber is installed.

use std::fs::OpenOptions;
use std::io;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, LoggingConfig};

/// Install the global subscriber. Returns false when logging is disabled or a
/// subscriber was already installed.
pub fn init_tracing(config: &LoggingConfig) -> io::Result<bool> {
    let Some(path) = &config.file else {
        return Ok(false);
    };
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    let filter = EnvFilter::try_from_env("LOG_LEVEL")
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    let format = std::env::var("LOG_FORMAT")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(config.format);

    let installed = match format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.try_init(),
    };
    Ok(installed.is_ok())
}
