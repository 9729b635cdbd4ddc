//! Configuration schema for the runner.
//!
//! Defines all user-configurable settings with their default values.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Runner configuration.
///
/// Settings are read under the "rester" key of a JSON settings document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RunnerConfig {
    /// Per-request timeout in milliseconds.
    ///
    /// Default: 5000 (5 seconds)
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Whether to validate SSL/TLS certificates.
    ///
    /// Default: true
    #[serde(default = "default_validate_ssl")]
    pub validate_ssl: bool,

    /// Headers added to every request unless the request sets them.
    #[serde(default = "default_headers")]
    pub default_headers: HashMap<String, String>,

    /// Base directory for relative log file targets.
    ///
    /// Default: the current directory
    #[serde(default)]
    pub work_dir: Option<PathBuf>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            validate_ssl: default_validate_ssl(),
            default_headers: default_headers(),
            work_dir: None,
        }
    }
}

impl RunnerConfig {
    /// Validates the configuration and returns errors if any settings are invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.timeout == 0 {
            return Err("timeout must be greater than 0".to_string());
        }

        if let Some(name) = self.default_headers.keys().find(|name| name.trim().is_empty()) {
            return Err(format!("defaultHeaders contains an empty header name '{}'", name));
        }

        Ok(())
    }

    /// Returns the timeout as a `std::time::Duration`.
    pub fn timeout_duration(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.timeout)
    }

    /// Returns the timeout in seconds for ExecutionConfig, rounded up.
    pub fn timeout_secs(&self) -> u64 {
        self.timeout.div_ceil(1000)
    }

}

fn default_timeout() -> u64 {
    5000
}

fn default_validate_ssl() -> bool {
    true
}

fn default_headers() -> HashMap<String, String> {
    let mut headers = HashMap::new();
    headers.insert(
        "User-Agent".to_string(),
        format!("rester/{}", env!("CARGO_PKG_VERSION")),
    );
    headers
}
