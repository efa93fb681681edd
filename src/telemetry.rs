//! Structured logging setup for supervisor binaries.

use thiserror::Error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{EnvFilter, Layer, fmt};

/// Filter applied when `RUST_LOG` is unset or invalid.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Errors raised while installing the global subscriber.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// A global subscriber was already installed.
    #[error("failed to install tracing subscriber: {0}")]
    Install(#[from] TryInitError),
}

/// Builds the log filter from `RUST_LOG`, falling back to
/// [`DEFAULT_LOG_FILTER`].
#[must_use]
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Installs a formatted stderr subscriber filtered by [`env_filter`].
///
/// Logs go to stderr so the supervised command keeps stdout to itself.
///
/// # Errors
///
/// Returns [`TelemetryError::Install`] when a global subscriber already
/// exists.
pub fn init_tracing() -> Result<(), TelemetryError> {
    let log_layer = fmt::layer()
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .with_filter(env_filter())
        .boxed();

    tracing_subscriber::registry().with(log_layer).try_init()?;
    Ok(())
}
