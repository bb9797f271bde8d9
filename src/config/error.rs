//! Errors from loading, checking and saving `lineport.toml`.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} is not a valid lineport config: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Cannot encode configuration as TOML: {0}")]
    Encode(#[from] toml::ser::Error),

    #[error("Cannot write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A value the engine cannot run with. `key` is the dotted TOML path,
    /// e.g. `port.speed`.
    #[error("Invalid {key}: {reason}")]
    Invalid { key: &'static str, reason: String },

    /// A `LINEPORT_*` override that does not parse.
    #[error("{var}={value:?} is not a valid {expected}")]
    Env {
        var: String,
        value: String,
        expected: &'static str,
    },

    /// `save` on a loader that was built from defaults.
    #[error("Configuration was not loaded from a file, use save_to with an explicit path")]
    NoFilePath,
}

impl ConfigError {
    pub fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }

    /// Dotted config key a validation error refers to.
    pub fn key(&self) -> Option<&'static str> {
        match self {
            Self::Invalid { key, .. } => Some(key),
            _ => None,
        }
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;
