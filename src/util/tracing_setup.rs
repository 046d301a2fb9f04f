//! Tracing/logging initialization

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::{LogFormat, LoggingConfig};

/// Initialize the tracing subscriber based on configuration
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .with_context(|| format!("Invalid log level: {}", config.level))?;

    let subscriber = tracing_subscriber::registry().with(filter);

    let result = match config.format {
        LogFormat::Json => {
            let fmt_layer = fmt::layer()
                .json()
                .with_target(true)
                .with_file(true)
                .with_line_number(true);
            subscriber.with(fmt_layer).try_init()
        }
        LogFormat::Pretty => subscriber.with(fmt::layer().pretty().with_target(true)).try_init(),
        LogFormat::Compact => subscriber.with(fmt::layer().compact().with_target(false)).try_init(),
    };

    result.context("Failed to install tracing subscriber")
}
