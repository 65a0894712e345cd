//! Tracing subscriber bootstrap.

use crate::config::{LogFormat, LoggingConfig};
use crate::error::Result;
use tracing_subscriber::EnvFilter;

/// Installs the global `tracing` subscriber described by `config`.
///
/// `RUST_LOG` takes precedence over the configured level. Returns `Ok(false)`
/// when a subscriber was already installed, which is not an error: embedding
/// applications and tests commonly install their own first.
pub fn init_tracing(config: &LoggingConfig) -> Result<bool> {
    let level = config.parse_level()?;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_ascii_lowercase()));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(config.file_line)
        .with_line_number(config.file_line);

    let installed = match config.format {
        LogFormat::Text => builder.try_init().is_ok(),
        LogFormat::Json => builder.json().try_init().is_ok(),
    };

    Ok(installed)
}
