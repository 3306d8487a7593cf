//! Observability: logging and tracing setup.
//!
//! Library code records `tracing` events and `metrics` counters
//! unconditionally; both are no-ops until a subscriber or recorder is
//! installed. The binary calls [`init`] once at startup.

mod logging;

pub use logging::{LogFormat, LoggingConfig};

use crate::config::LoggingSettings;
use crate::{Error, Result};
use std::sync::OnceLock;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

static OBSERVABILITY_INIT: OnceLock<()> = OnceLock::new();

/// Initializes logging from config settings.
///
/// # Errors
///
/// Returns an error if observability has already been initialized.
pub fn init_from_settings(settings: &LoggingSettings, verbose: bool) -> Result<()> {
    init(LoggingConfig::from_settings(settings, verbose))
}

/// Installs the global `tracing` subscriber, writing to stderr.
///
/// # Errors
///
/// Returns an error if observability has already been initialized.
pub fn init(config: LoggingConfig) -> Result<()> {
    if OBSERVABILITY_INIT.get().is_some() {
        return Err(Error::OperationFailed {
            operation: "observability_init".to_string(),
            cause: "observability already initialized".to_string(),
        });
    }

    match config.format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr)
                        .with_current_span(true)
                        .with_span_list(true)
                        .with_target(true)
                        .with_thread_names(true),
                )
                .with(config.filter)
                .try_init()
                .map_err(init_error)?;
        },
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(
                    tracing_subscriber::fmt::layer()
                        .pretty()
                        .with_writer(std::io::stderr)
                        .with_target(true)
                        .with_thread_names(true),
                )
                .with(config.filter)
                .try_init()
                .map_err(init_error)?;
        },
    }

    OBSERVABILITY_INIT
        .set(())
        .map_err(|()| Error::OperationFailed {
            operation: "observability_init".to_string(),
            cause: "failed to mark observability initialized".to_string(),
        })
}

/// Helper to convert init errors.
#[allow(clippy::needless_pass_by_value)]
fn init_error(e: tracing_subscriber::util::TryInitError) -> Error {
    Error::OperationFailed {
        operation: "observability_init".to_string(),
        cause: e.to_string(),
    }
}
