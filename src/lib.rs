//! Line-oriented serial port engine.
//!
//! A [`Port`](engine::Port) turns a byte-at-a-time [`Transport`](port::Transport)
//! into complete CR/LF terminated lines, delivered synchronously to a
//! [`PortListener`](port::PortListener). It is driven by a single
//! time-budgeted call, `listen(budget_ms)`, from the caller's own scheduling
//! loop, and handles reconnect backoff and baud changes on its own.
//!
//! # Modules
//!
//! - `engine`: the Port, line framing, lifecycle control and clocks
//! - `port`: the transport and listener traits, a UART driver and a mock
//! - `config`: TOML configuration with environment overrides
//! - `logging`: `tracing-subscriber` setup for binaries
//! - `monitor`: the polling loop and line printer used by `line-monitor`
//! - `error`: application-level errors

pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod monitor;
pub mod port;

pub use engine::{ManualClock, OverflowPolicy, Port, PortSettings, SystemClock};
pub use error::{AppError, AppResult};
pub use port::{MockTransport, PortError, PortListener, SerialTransport, Transport};

pub use config::{Config, ConfigError, ConfigLoader, ConfigResult};
