//! Process-wide `tracing` setup driven by [`Config`].
//!
//! Bridge events are written to stderr with RFC 3339 UTC timestamps. The
//! filter comes from `log_filter` and the layout from `log_format`; JSON
//! output flattens event fields into the top-level object.

use std::io::{self, IsTerminal};

use once_cell::sync::OnceCell;
use tracing::Subscriber;
use tracing::subscriber::SetGlobalDefaultError;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::fmt::time::UtcTime;

use tessera_config::Config;

static INSTALLED: OnceCell<()> = OnceCell::new();

/// Proof that the global subscriber is in place.
#[derive(Debug, Default, Clone, Copy)]
pub struct TelemetryHandle;

/// Failures while configuring telemetry.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// The configured filter expression does not parse.
    #[error("invalid log filter '{filter}': {message}")]
    Filter {
        /// Rejected expression.
        filter: String,
        /// Parser message.
        message: String,
    },
    /// Another global subscriber was already installed.
    #[error("failed to install telemetry subscriber: {0}")]
    Subscriber(SetGlobalDefaultError),
}

/// Installs the global subscriber on first use.
///
/// Later calls return a new handle without touching global state, even when
/// `config` differs from the first call.
///
/// # Errors
///
/// Returns [`TelemetryError::Filter`] for an unparsable filter and
/// [`TelemetryError::Subscriber`] when a foreign subscriber already owns the
/// global slot.
pub fn initialise(config: &Config) -> Result<TelemetryHandle, TelemetryError> {
    INSTALLED
        .get_or_try_init(|| {
            let subscriber = build_subscriber(config)?;
            tracing::subscriber::set_global_default(subscriber)
                .map_err(TelemetryError::Subscriber)
        })
        .map(|_| TelemetryHandle)
}

/// Builds the subscriber described by `config` without installing it.
///
/// # Errors
///
/// Returns [`TelemetryError::Filter`] for an unparsable filter.
pub fn build_subscriber(
    config: &Config,
) -> Result<Box<dyn Subscriber + Send + Sync>, TelemetryError> {
    let filter =
        EnvFilter::try_new(config.log_filter()).map_err(|error| TelemetryError::Filter {
            filter: config.log_filter().to_owned(),
            message: error.to_string(),
        })?;

    let builder = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_timer(UtcTime::rfc_3339());

    if config.log_format().is_structured() {
        Ok(Box::new(builder.json().flatten_event(true).finish()))
    } else {
        Ok(Box::new(builder.compact().finish()))
    }
}
