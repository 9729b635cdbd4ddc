//! Configuration management for the runner.
//!
//! Configuration is loaded from a JSON settings document under the "rester"
//! key, merged with defaults and kept in a process-wide singleton.

pub mod schema;

pub use schema::RunnerConfig;

use once_cell::sync::Lazy;
use serde_json::Value;
use std::fmt;
use std::path::Path;
use std::sync::RwLock;

/// Global configuration instance.
static CONFIG: Lazy<RwLock<RunnerConfig>> = Lazy::new(|| RwLock::new(RunnerConfig::default()));

/// Errors raised while loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// The settings file could not be read.
    Io(std::io::Error),

    /// The settings file is not valid JSON.
    Parse(String),

    /// A setting has an invalid value.
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "Failed to read configuration: {}", err),
            ConfigError::Parse(msg) => write!(f, "Failed to parse configuration: {}", msg),
            ConfigError::Invalid(msg) => write!(f, "Invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

/// Loads configuration from a JSON value.
///
/// Reads the "rester" settings, merges them over defaults, validates the
/// result and updates the global configuration. Settings that fail to
/// deserialize are logged and the defaults are used instead.
///
/// # Example
///
/// ```no_run
/// use rester::config::load_config;
/// use serde_json::json;
///
/// let settings = json!({
///     "rester": {
///         "timeout": 10000,
///         "validateSsl": false
///     }
/// });
///
/// let config = load_config(Some(settings)).unwrap();
/// assert_eq!(config.timeout, 10000);
/// ```
pub fn load_config(settings_json: Option<Value>) -> Result<RunnerConfig, ConfigError> {
    let mut config = RunnerConfig::default();

    if let Some(settings) = settings_json {
        if let Some(rester_settings) = settings.get("rester") {
            match serde_json::from_value::<RunnerConfig>(rester_settings.clone()) {
                Ok(user_config) => config = user_config,
                Err(e) => {
                    log::warn!("Failed to parse rester settings: {}. Using defaults.", e);
                }
            }
        }
    }

    config.validate().map_err(ConfigError::Invalid)?;

    if let Ok(mut global_config) = CONFIG.write() {
        *global_config = config.clone();
    }

    Ok(config)
}

/// Loads configuration from a JSON settings file.
pub fn load_config_file(path: impl AsRef<Path>) -> Result<RunnerConfig, ConfigError> {
    let content = std::fs::read_to_string(path.as_ref())?;
    let settings: Value = serde_json::from_str(&content)?;
    load_config(Some(settings))
}

/// Gets a copy of the current global configuration.
///
/// Returns the defaults if nothing has been loaded yet.
pub fn get_config() -> RunnerConfig {
    CONFIG
        .read()
        .map(|c| c.clone())
        .unwrap_or_else(|_| RunnerConfig::default())
}

/// Updates the configuration in place.
///
/// An update that leaves the configuration invalid reverts it to defaults.
///
/// ```no_run
/// use rester::config::update_config;
///
/// update_config(|config| {
///     config.validate_ssl = false;
/// });
/// ```
pub fn update_config<F>(updater: F)
where
    F: FnOnce(&mut RunnerConfig),
{
    if let Ok(mut config) = CONFIG.write() {
        updater(&mut config);

        if let Err(e) = config.validate() {
            log::warn!("Configuration validation failed after update: {}", e);
            *config = RunnerConfig::default();
        }
    }
}

/// Resets the configuration to defaults.
pub fn reset_config() {
    if let Ok(mut config) = CONFIG.write() {
        *config = RunnerConfig::default();
    }
}
