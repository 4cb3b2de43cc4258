//! Tracing subscriber setup.
//!
//! Logs go to stderr so that command output on stdout stays machine-readable.
//! `RUST_LOG`, when set, overrides the configured filter.

use std::io;

use tracing::debug;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::{LogFormat, LoggingConfig};

/// Builds the filter: `RUST_LOG` first, then the configured directive,
/// then plain `info` if the directive does not parse.
pub fn env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.filter))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Installs the global subscriber. If one is already installed it stays in
/// place and the failure is reported through it at debug level.
pub fn init(config: &LoggingConfig) {
    let builder = fmt()
        .with_env_filter(env_filter(config))
        .with_target(false)
        .with_writer(io::stderr);

    let result = match config.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    if let Err(e) = result {
        debug!(error = %e, "global subscriber already installed, keeping it");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice_keeps_first_subscriber() {
        let config = LoggingConfig::default();
        init(&config);
        init(&config);
    }
}
