//! Transport-level error types.
//!
//! These never reach the caller of [`Port::listen`](crate::engine::Port::listen);
//! the engine recovers from all of them locally by closing and later
//! reopening the transport. They exist so drivers can say *why* an open or a
//! read failed, which ends up in the logs.

use thiserror::Error;

/// Errors a [`Transport`](super::Transport) can report.
#[derive(Debug, Error)]
pub enum PortError {
    /// The specified serial device was not found on the system.
    #[error("Serial port not found: {0}")]
    NotFound(String),

    /// An I/O error occurred during port operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Port configuration failed (bad baud rate, unsupported settings).
    #[error("Configuration error: {0}")]
    Config(String),

    /// Attempted to read from a port that's not open.
    #[error("Port is not open")]
    NotOpen,

    /// The transport reported a fault that is not an I/O error.
    #[error("Transport fault: {0}")]
    Fault(String),

    /// A serialport-specific error occurred.
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),
}

impl PortError {
    /// Create a NotFound error from a device path.
    pub fn not_found(port_name: impl Into<String>) -> Self {
        Self::NotFound(port_name.into())
    }

    /// Create a Config error from a message.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a Fault error from a message.
    pub fn fault(message: impl Into<String>) -> Self {
        Self::Fault(message.into())
    }
}
