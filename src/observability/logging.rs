//! Structured logging configuration.

use crate::config::LoggingSettings;
use tracing_subscriber::EnvFilter;

/// Output format of the `fmt` layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable multi-line output.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

impl LogFormat {
    /// Parses a format name. Anything but "json" is pretty.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Pretty,
        }
    }
}

/// Resolved logging configuration.
#[derive(Debug)]
pub struct LoggingConfig {
    /// Event filter.
    pub filter: EnvFilter,
    /// Output format.
    pub format: LogFormat,
}

impl LoggingConfig {
    /// Builds the logging configuration.
    ///
    /// `RUST_LOG` wins over the configured level; `verbose` raises the
    /// configured level to `debug`. An unparsable directive falls back to
    /// `info`.
    #[must_use]
    pub fn from_settings(settings: &LoggingSettings, verbose: bool) -> Self {
        let level = if verbose { "debug" } else { settings.level.as_str() };
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(level))
            .unwrap_or_else(|_| EnvFilter::new("info"));

        Self {
            filter,
            format: LogFormat::parse(&settings.format),
        }
    }
}
