//! Configuration loader with file resolution and environment override support.

use super::error::{ConfigError, ConfigResult};
use super::schema::Config;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Environment variable prefix for overrides
const ENV_PREFIX: &str = "LINEPORT";

/// Config file name
const CONFIG_FILE_NAME: &str = "lineport.toml";

/// Directory name under the platform config dir
const APP_DIR_NAME: &str = "lineport";

/// Environment variable for explicit config path
const CONFIG_PATH_ENV: &str = "LINEPORT_CONFIG";

/// Configuration loader with resolution and override logic.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Resolved config file path (if any)
    pub config_path: Option<PathBuf>,
    /// The loaded configuration
    pub config: Config,
}

impl ConfigLoader {
    /// Load configuration using standard resolution order.
    ///
    /// Resolution priority (highest to lowest):
    /// 1. `LINEPORT_CONFIG` environment variable (explicit path)
    /// 2. `./lineport.toml` (current directory)
    /// 3. `$XDG_CONFIG_HOME/lineport/lineport.toml` or `~/.config/...`
    ///    (`%APPDATA%\lineport\lineport.toml` on Windows)
    /// 4. Built-in defaults (no file required)
    ///
    /// Environment variables override file values. The result is not
    /// validated here, so callers can layer their own overrides first and
    /// then call [`Config::validate`] once.
    pub fn load() -> ConfigResult<Self> {
        let config_path = resolve_config_path();

        let mut config = match config_path {
            Some(ref path) => load_from_file(path)?,
            None => Config::default(),
        };

        apply_env_overrides(&mut config)?;

        Ok(Self { config_path, config })
    }

    /// Load configuration from a specific file path. Like [`load`](Self::load),
    /// this does not validate.
    pub fn load_from(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref().to_path_buf();
        let mut config = load_from_file(&path)?;
        apply_env_overrides(&mut config)?;

        Ok(Self {
            config_path: Some(path),
            config,
        })
    }

    /// Create a loader with default configuration (no file).
    pub fn with_defaults() -> Self {
        let mut config = Config::default();
        // Still apply env overrides even with defaults
        if apply_env_overrides(&mut config).is_err() || config.validate().is_err() {
            config = Config::default();
        }

        Self {
            config_path: None,
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    pub fn into_config(self) -> Config {
        self.config
    }

    /// Save the current configuration to the file it was loaded from.
    pub fn save(&self) -> ConfigResult<()> {
        let path = self
            .config_path
            .as_ref()
            .ok_or(ConfigError::NoFilePath)?;

        save_to_file(&self.config, path)
    }

    pub fn save_to(&self, path: impl AsRef<Path>) -> ConfigResult<()> {
        save_to_file(&self.config, path.as_ref())
    }

    /// Reload configuration from file (if path is set). The running config
    /// is only replaced by one that validates.
    pub fn reload(&mut self) -> ConfigResult<()> {
        if let Some(ref path) = self.config_path {
            let mut config = load_from_file(path)?;
            apply_env_overrides(&mut config)?;
            config.validate()?;
            self.config = config;
        }
        Ok(())
    }
}

/// Resolve the configuration file path using standard locations.
pub fn resolve_config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(path);
        if path.exists() {
            return Some(path);
        }
    }

    let cwd_config = PathBuf::from(CONFIG_FILE_NAME);
    if cwd_config.exists() {
        return Some(cwd_config);
    }

    get_default_config_path().filter(|p| p.exists())
}

/// Get the platform-specific config directory.
fn get_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var("APPDATA").ok().map(PathBuf::from)
    }

    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("XDG_CONFIG_HOME")
            .ok()
            .map(PathBuf::from)
            .or_else(|| {
                std::env::var("HOME")
                    .ok()
                    .map(|h| PathBuf::from(h).join(".config"))
            })
    }
}

/// Get the default config directory for creating new config files.
pub fn get_default_config_dir() -> Option<PathBuf> {
    get_config_dir().map(|d| d.join(APP_DIR_NAME))
}

/// Get the default config file path for creating new config files.
pub fn get_default_config_path() -> Option<PathBuf> {
    get_default_config_dir().map(|d| d.join(CONFIG_FILE_NAME))
}

fn load_from_file(path: &Path) -> ConfigResult<Config> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn save_to_file(config: &Config, path: &Path) -> ConfigResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Parse `LINEPORT_<suffix>` into `T` if it is set.
fn env_parse<T: FromStr>(suffix: &str, expected: &'static str) -> ConfigResult<Option<T>> {
    let var = format!("{}_{}", ENV_PREFIX, suffix);
    match std::env::var(&var) {
        Ok(value) => match value.trim().parse() {
            Ok(parsed) => Ok(Some(parsed)),
            Err(_) => Err(ConfigError::Env { var, value, expected }),
        },
        Err(_) => Ok(None),
    }
}

fn env_flag(suffix: &str) -> Option<bool> {
    std::env::var(format!("{}_{}", ENV_PREFIX, suffix))
        .ok()
        .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
}

/// Apply environment variable overrides to the configuration.
///
/// Environment variables follow the pattern: `LINEPORT_<SECTION>_<KEY>`
/// For example:
/// - `LINEPORT_PORT_DEVICE=/dev/ttyUSB0`
/// - `LINEPORT_PORT_SPEED=4800`
/// - `LINEPORT_MONITOR_BUDGET_MS=10`
fn apply_env_overrides(config: &mut Config) -> ConfigResult<()> {
    // Port overrides
    if let Ok(val) = std::env::var(format!("{}_PORT_NAME", ENV_PREFIX)) {
        config.port.name = val;
    }
    if let Ok(val) = std::env::var(format!("{}_PORT_DEVICE", ENV_PREFIX)) {
        config.port.device = Some(val);
    }
    if let Some(speed) = env_parse("PORT_SPEED", "baud rate")? {
        config.port.speed = speed;
    }
    if let Some(backoff) = env_parse("PORT_BACKOFF_MS", "backoff")? {
        config.port.backoff_ms = backoff;
    }
    if let Some(capacity) = env_parse("PORT_BUFFER_CAPACITY", "buffer capacity")? {
        config.port.buffer_capacity = capacity;
    }
    if let Some(trace) = env_flag("PORT_TRACE") {
        config.port.trace = trace;
    }

    // Monitor overrides
    if let Some(budget) = env_parse("MONITOR_BUDGET_MS", "budget")? {
        config.monitor.budget_ms = budget;
    }
    if let Some(tick) = env_parse("MONITOR_TICK_MS", "tick")? {
        config.monitor.tick_ms = tick;
    }

    // Logging overrides
    if let Ok(val) = std::env::var(format!("{}_LOGGING_LEVEL", ENV_PREFIX)) {
        config.logging.level = val;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    #[test]
    #[serial]
    fn test_default_loader() {
        let loader = ConfigLoader::with_defaults();
        assert_eq!(loader.config().port.backoff_ms, 1000);
        assert!(loader.config_path.is_none());
    }

    #[test]
    #[serial]
    fn test_env_override() {
        env::set_var("LINEPORT_PORT_SPEED", "4800");
        env::set_var("LINEPORT_PORT_TRACE", "1");

        let loader = ConfigLoader::with_defaults();
        assert_eq!(loader.config().port.speed, 4800);
        assert!(loader.config().port.trace);

        env::remove_var("LINEPORT_PORT_SPEED");
        env::remove_var("LINEPORT_PORT_TRACE");
    }

    #[test]
    #[serial]
    fn test_bad_env_value_is_reported() {
        env::set_var("LINEPORT_MONITOR_BUDGET_MS", "soon");

        let mut config = Config::default();
        let err = apply_env_overrides(&mut config).unwrap_err();
        assert!(matches!(err, ConfigError::Env { ref value, .. } if value == "soon"));
        assert!(err.to_string().contains("LINEPORT_MONITOR_BUDGET_MS"));

        // with_defaults falls back instead of failing
        let loader = ConfigLoader::with_defaults();
        assert_eq!(loader.config().monitor.budget_ms, 20);

        env::remove_var("LINEPORT_MONITOR_BUDGET_MS");
    }

    #[test]
    #[serial]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE_NAME);

        let mut loader = ConfigLoader::with_defaults();
        loader.config_mut().port.device = Some("/dev/ttyAMA0".to_string());
        loader.config_mut().port.speed = 9600;
        loader.save_to(&path).unwrap();

        let loaded = ConfigLoader::load_from(&path).unwrap();
        assert_eq!(loaded.config().port.device.as_deref(), Some("/dev/ttyAMA0"));
        assert_eq!(loaded.config().port.speed, 9600);
        assert_eq!(loaded.config_path.as_deref(), Some(path.as_path()));
    }

    #[test]
    #[serial]
    fn test_load_from_unparsable_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[port\n").unwrap();

        let err = ConfigLoader::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { path: ref p, .. } if p == &path));
    }

    #[test]
    #[serial]
    fn test_load_leaves_validation_to_caller() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[port]\nspeed = 0\n").unwrap();

        let mut loader = ConfigLoader::load_from(&path).unwrap();
        assert_eq!(loader.config().validate().unwrap_err().key(), Some("port.speed"));

        loader.config_mut().port.speed = 4800;
        assert!(loader.config().validate().is_ok());
    }

    #[test]
    #[serial]
    fn test_reload_keeps_config_on_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[port]\nspeed = 9600\n").unwrap();
        let mut loader = ConfigLoader::load_from(&path).unwrap();

        std::fs::write(&path, "[port]\nspeed = 0\n").unwrap();
        assert!(matches!(loader.reload(), Err(ConfigError::Invalid { key: "port.speed", .. })));
        assert_eq!(loader.config().port.speed, 9600);
    }

    #[test]
    #[serial]
    fn test_missing_file_is_read_error() {
        let result = ConfigLoader::load_from("/definitely/not/here/lineport.toml");
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[test]
    #[serial]
    fn test_explicit_config_env_wins() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "[port]\nname = \"depth\"\n").unwrap();
        env::set_var(CONFIG_PATH_ENV, &path);

        let loader = ConfigLoader::load().unwrap();
        assert_eq!(loader.config().port.name, "depth");

        env::remove_var(CONFIG_PATH_ENV);
    }

    #[test]
    #[serial]
    fn test_save_without_path_fails() {
        let loader = ConfigLoader::with_defaults();
        assert!(matches!(loader.save(), Err(ConfigError::NoFilePath)));
    }
}
