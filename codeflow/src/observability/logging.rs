//! Subscriber setup for `tracing`.
//!
//! Logs go to stderr so that stdout stays reserved for the produced artifact.

use crate::config::{LogFormat, LoggingConfig, ENV_LOG};
use crate::errors::CodeflowError;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Installs the global subscriber.
///
/// The `CODEFLOW_LOG` environment variable, when it holds a valid filter,
/// takes precedence over `config.level`.
///
/// # Errors
///
/// Returns `CodeflowError::Config` if the level is not a valid filter or a
/// global subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<(), CodeflowError> {
    let filter = build_env_filter(config)?;
    let registry = Registry::default().with(filter);

    let result = match config.format {
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_writer(std::io::stderr),
            )
            .try_init(),
        LogFormat::Text => registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_writer(std::io::stderr),
            )
            .try_init(),
    };

    result.map_err(|e| CodeflowError::Config(format!("failed to install logger: {e}")))
}

/// Builds the filter from `CODEFLOW_LOG` or the configured level.
///
/// # Errors
///
/// Returns `CodeflowError::Config` if the configured level does not parse.
pub fn build_env_filter(config: &LoggingConfig) -> Result<EnvFilter, CodeflowError> {
    if let Ok(filter) = EnvFilter::try_from_env(ENV_LOG) {
        return Ok(filter);
    }

    EnvFilter::try_new(&config.level)
        .map_err(|e| CodeflowError::Config(format!("invalid log level '{}': {e}", config.level)))
}
