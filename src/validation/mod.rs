//! Response validation.
//!
//! A response is checked against a request's [`Validation`] block in a fixed
//! order: status, then headers, then JSON. The first failing aspect is
//! reported and the remaining aspects are not evaluated.

pub mod matcher;

pub use matcher::{validate, Matcher, PatternError};

use crate::models::{Response, Validation, Value};

/// Outcome of matching a value against a pattern.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationResult {
    Valid,
    Invalid {
        /// Human-readable description of the mismatch.
        message: String,
        /// The offending actual value, when there is one.
        value: Option<Value>,
    },
}

impl ValidationResult {
    /// Creates an invalid result citing `value`.
    pub fn invalid(message: impl Into<String>, value: &Value) -> Self {
        ValidationResult::Invalid {
            message: message.into(),
            value: Some(value.clone()),
        }
    }

    /// Creates an invalid result with no value to cite.
    pub fn failure(message: impl Into<String>) -> Self {
        ValidationResult::Invalid {
            message: message.into(),
            value: None,
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid)
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            ValidationResult::Valid => None,
            ValidationResult::Invalid { message, .. } => Some(message),
        }
    }

    /// Prefixes the message of an invalid result.
    fn context(self, aspect: &str) -> Self {
        match self {
            ValidationResult::Valid => ValidationResult::Valid,
            ValidationResult::Invalid { message, value } => ValidationResult::Invalid {
                message: format!("{} invalid: {}", aspect, message),
                value,
            },
        }
    }
}

/// Validates `response` against `validation`.
///
/// Header pattern keys are compared case-insensitively. A JSON pattern
/// against a response whose body did not decode as JSON is a failure.
pub fn validate_response(validation: &Validation, response: &Response) -> ValidationResult {
    if let Some(status) = &validation.status {
        let result = validate(status, &Value::Int(response.status as i64)).context("status");
        if !result.is_valid() {
            return result;
        }
    }

    if let Some(headers) = &validation.headers {
        let result =
            validate(&lowercase_keys(headers), &lowercase_keys(&response.headers_value()))
                .context("headers");
        if !result.is_valid() {
            return result;
        }
    }

    if let Some(json) = &validation.json {
        let Some(actual) = &response.json else {
            return ValidationResult::failure("failed to decode JSON object from response");
        };
        let result = validate(json, actual).context("json");
        if !result.is_valid() {
            return result;
        }
    }

    ValidationResult::Valid
}

fn lowercase_keys(value: &Value) -> Value {
    match value {
        Value::Dictionary(dict) => Value::Dictionary(
            dict.iter()
                .map(|(key, value)| (key.to_ascii_lowercase(), value.clone()))
                .collect(),
        ),
        other => other.clone(),
    }
}
