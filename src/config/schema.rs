//! Configuration schema definitions.
//!
//! Every section carries `#[serde(default)]`, so a config file only needs
//! the keys it wants to change.

use super::error::{ConfigError, ConfigResult};
use crate::engine::{OverflowPolicy, PortSettings, DEFAULT_BACKOFF_MS, DEFAULT_PORT_SPEED, PORT_BUFFER_SIZE};
use crate::port::CharFraming;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// The serial port being monitored
    pub port: PortConfig,
    /// Poll loop and output settings
    pub monitor: MonitorConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Config {
    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.port.speed == 0 {
            return Err(ConfigError::invalid("port.speed", "must be greater than zero"));
        }
        if self.port.buffer_capacity < 2 {
            return Err(ConfigError::invalid(
                "port.buffer_capacity",
                "must hold at least one byte plus the terminator slot",
            ));
        }
        if let OverflowPolicy::Grow { max } = self.port.overflow {
            if max < self.port.buffer_capacity {
                return Err(ConfigError::invalid(
                    "port.overflow.max",
                    "must not be smaller than port.buffer_capacity",
                ));
            }
        }
        if self.monitor.budget_ms == 0 {
            return Err(ConfigError::invalid("monitor.budget_ms", "must be greater than zero"));
        }
        Ok(())
    }
}

/// Port section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PortConfig {
    /// Short identifier used in logs
    pub name: String,
    /// Device path, e.g. "/dev/ttyUSB0" or "COM3"
    pub device: Option<String>,
    /// Baud rate
    pub speed: u32,
    /// Minimum delay between reopen attempts in milliseconds
    pub backoff_ms: u64,
    /// Line buffer capacity in bytes
    pub buffer_capacity: usize,
    /// What to do with lines longer than the buffer
    pub overflow: OverflowPolicy,
    /// Keep a half-received line across reconnects
    pub keep_partial_on_close: bool,
    /// Log every completed line
    pub trace: bool,
    /// Single-byte read timeout in milliseconds
    pub read_timeout_ms: u64,
    /// Data bits, parity, stop bits, flow control
    pub framing: CharFraming,
}

impl Default for PortConfig {
    fn default() -> Self {
        Self {
            name: "serial".to_string(),
            device: None,
            speed: DEFAULT_PORT_SPEED,
            backoff_ms: DEFAULT_BACKOFF_MS,
            buffer_capacity: PORT_BUFFER_SIZE,
            overflow: OverflowPolicy::Wrap,
            keep_partial_on_close: false,
            trace: false,
            read_timeout_ms: 1,
            framing: CharFraming::default(),
        }
    }
}

impl PortConfig {
    /// Engine settings derived from this section.
    pub fn settings(&self) -> PortSettings {
        PortSettings {
            speed: self.speed,
            backoff_ms: self.backoff_ms,
            buffer_capacity: self.buffer_capacity,
            overflow: self.overflow,
            keep_partial_on_close: self.keep_partial_on_close,
            trace: self.trace,
        }
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

/// Monitor loop section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Time budget handed to each `listen` call, in milliseconds
    pub budget_ms: u64,
    /// Scheduler tick between `listen` calls, in milliseconds
    pub tick_ms: u64,
    /// How completed lines are printed
    pub output: OutputFormat,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            budget_ms: 20,
            tick_ms: 50,
            output: OutputFormat::Plain,
        }
    }
}

impl MonitorConfig {
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}

/// Line output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// The raw line, one per row
    #[default]
    Plain,
    /// One JSON object per line
    Json,
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level or filter directive: "trace", "debug", "info", "lineport=debug", ...
    pub level: String,
    /// Log file path (stderr when unset)
    pub file: Option<PathBuf>,
    /// Log format: "json", "pretty", "compact"
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            format: LogFormat::Compact,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON format
    Json,
    /// Pretty multi-line format
    Pretty,
    /// Compact single-line format
    #[default]
    Compact,
}
