//! Application-level error type used by the `line-monitor` binary.
//!
//! The engine itself never returns errors from `listen`; these cover the
//! setup around it (configuration, logging, output).

use crate::config::ConfigError;
use crate::logging::LoggingError;
use thiserror::Error;

/// A specialized `Result` type for application setup.
pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Logging setup failed: {0}")]
    Logging(#[from] LoggingError),

    #[error("No serial device given. Pass one on the command line or set port.device in the config file.")]
    MissingDevice,

    #[error("Failed to write output: {0}")]
    Output(#[from] std::io::Error),

    #[error("Failed to encode output: {0}")]
    Encode(#[from] serde_json::Error),
}
