//! Request execution configuration.
//!
//! Values here are forwarded verbatim to the HTTP collaborator with every call.

use crate::config::get_config;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Configuration for executing requests.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExecutionConfig {
    /// Per-request timeout in seconds. Expiry fails only that request.
    pub timeout_secs: u64,

    /// Whether TLS certificates are validated.
    pub validate_certificate: bool,

    /// Headers added to every request unless the request sets them itself.
    pub default_headers: HashMap<String, String>,
}

impl ExecutionConfig {
    /// Creates a config with the given timeout, certificate validation on
    /// and no default headers.
    pub fn new(timeout_secs: u64) -> Self {
        Self {
            timeout_secs,
            validate_certificate: true,
            default_headers: HashMap::new(),
        }
    }

    pub fn with_validate_certificate(mut self, validate: bool) -> Self {
        self.validate_certificate = validate;
        self
    }

    /// Returns the timeout as a `std::time::Duration`.
    pub fn timeout_duration(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_secs)
    }

    /// Creates an ExecutionConfig from the global runner configuration.
    pub fn from_global_config() -> Self {
        let global_config = get_config();
        Self {
            timeout_secs: global_config.timeout_secs(),
            validate_certificate: global_config.validate_ssl,
            default_headers: global_config.default_headers,
        }
    }
}

impl Default for ExecutionConfig {
    /// Reads timeout, certificate validation and default headers from the
    /// global runner configuration.
    fn default() -> Self {
        Self::from_global_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execution_config_new() {
        let config = ExecutionConfig::new(60);
        assert_eq!(config.timeout_secs, 60);
        assert!(config.validate_certificate);
        assert!(config.default_headers.is_empty());
    }

    #[test]
    fn test_timeout_duration() {
        let config = ExecutionConfig::new(45);
        assert_eq!(config.timeout_duration(), std::time::Duration::from_secs(45));
    }

    #[test]
    fn test_insecure() {
        let config = ExecutionConfig::new(5).with_validate_certificate(false);
        assert!(!config.validate_certificate);
    }

    #[test]
    fn test_serialization() {
        let config = ExecutionConfig::new(120);
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("120"));

        let deserialized: ExecutionConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, config);
    }
}
