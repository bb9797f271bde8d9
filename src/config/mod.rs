//! Configuration module.
//!
//! TOML-based configuration with environment variable overrides.
//!
//! # Configuration Resolution
//!
//! 1. `LINEPORT_CONFIG` environment variable (explicit path)
//! 2. `./lineport.toml` (current directory)
//! 3. `~/.config/lineport/lineport.toml` (XDG on Linux/macOS)
//! 4. `%APPDATA%\lineport\lineport.toml` (Windows)
//! 5. Built-in defaults (no file required)
//!
//! # Environment Overrides
//!
//! The pattern is `LINEPORT_<SECTION>_<KEY>`, e.g.
//! `LINEPORT_PORT_DEVICE=/dev/ttyUSB0` or `LINEPORT_MONITOR_BUDGET_MS=10`.
//!
//! # Example
//!
//! ```rust,no_run
//! use lineport::config::ConfigLoader;
//!
//! let loader = ConfigLoader::load()?;
//! let config = loader.config();
//! println!("speed: {}", config.port.speed);
//! # Ok::<(), lineport::config::ConfigError>(())
//! ```

mod error;
mod loader;
mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::{get_default_config_dir, get_default_config_path, resolve_config_path, ConfigLoader};
pub use schema::{Config, LogFormat, LoggingConfig, MonitorConfig, OutputFormat, PortConfig};
