//! Structural pattern matching of response values.
//!
//! A pattern `Value` is compiled into a [`Matcher`] tree once, then checked
//! against an actual value:
//!
//! | Pattern                              | Matches when                                  |
//! |--------------------------------------|-----------------------------------------------|
//! | scalar                               | actual is equal (`1` equals `1.0`)            |
//! | `true`                               | the field is present, any value               |
//! | `".regex(<re>)"`                     | actual is a string and `<re>` is found in it  |
//! | dictionary                           | every pattern key exists and matches          |
//! | dictionary with only integer keys    | indexed elements of an array match            |
//! | array                                | same length, elements match pairwise          |

use super::ValidationResult;
use crate::models::{resolve_index, Value};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;

static REGEX_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^\.regex\((.*)\)$").expect("Failed to compile regex marker pattern")
});

/// Compiled pattern.
#[derive(Debug, Clone)]
pub enum Matcher {
    /// Literal equality.
    Equals(Value),
    /// Present with any value.
    Wildcard,
    /// Unanchored regular expression search over a string.
    Regex(Regex),
    /// Partial dictionary match: keys missing from the pattern are ignored.
    Contains(IndexMap<String, Matcher>),
    /// Array elements addressed by (possibly negative) index.
    Indexed(Vec<(i64, Matcher)>),
    /// Array matched element by element.
    Elements(Vec<Matcher>),
}

/// Error raised while compiling a pattern.
#[derive(Debug, Clone, PartialEq)]
pub enum PatternError {
    /// A `.regex(...)` marker holds an invalid regular expression.
    InvalidRegex { pattern: String, message: String },
}

impl std::fmt::Display for PatternError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PatternError::InvalidRegex { pattern, message } => {
                write!(f, "invalid regex '{}': {}", pattern, message)
            }
        }
    }
}

impl std::error::Error for PatternError {}

impl Matcher {
    /// Compiles a pattern value.
    pub fn compile(pattern: &Value) -> Result<Matcher, PatternError> {
        match pattern {
            Value::Bool(true) => Ok(Matcher::Wildcard),
            Value::String(text) => match REGEX_MARKER.captures(text) {
                Some(caps) => {
                    let source = &caps[1];
                    Regex::new(source)
                        .map(Matcher::Regex)
                        .map_err(|e| PatternError::InvalidRegex {
                            pattern: source.to_string(),
                            message: e.to_string(),
                        })
                }
                None => Ok(Matcher::Equals(pattern.clone())),
            },
            Value::Dictionary(dict) => {
                let indices: Option<Vec<i64>> =
                    dict.keys().map(|key| key.trim().parse::<i64>().ok()).collect();
                match indices {
                    Some(indices) if !indices.is_empty() => indices
                        .into_iter()
                        .zip(dict.values())
                        .map(|(index, sub)| Ok((index, Matcher::compile(sub)?)))
                        .collect::<Result<Vec<_>, _>>()
                        .map(Matcher::Indexed),
                    _ => dict
                        .iter()
                        .map(|(key, sub)| Ok((key.clone(), Matcher::compile(sub)?)))
                        .collect::<Result<IndexMap<_, _>, _>>()
                        .map(Matcher::Contains),
                }
            }
            Value::Array(items) => items
                .iter()
                .map(Matcher::compile)
                .collect::<Result<Vec<_>, _>>()
                .map(Matcher::Elements),
            Value::Null | Value::Bool(false) | Value::Int(_) | Value::Double(_) => {
                Ok(Matcher::Equals(pattern.clone()))
            }
        }
    }

    /// Checks `actual` against this matcher.
    pub fn validate(&self, actual: &Value) -> ValidationResult {
        match self {
            Matcher::Wildcard => ValidationResult::Valid,
            Matcher::Equals(expected) => {
                if expected == actual {
                    ValidationResult::Valid
                } else {
                    ValidationResult::invalid(
                        format!("({}) is not equal to ({})", actual, expected),
                        actual,
                    )
                }
            }
            Matcher::Regex(regex) => match actual {
                Value::String(text) if regex.is_match(text) => ValidationResult::Valid,
                Value::String(_) => ValidationResult::invalid(
                    format!("({}) does not match ({})", actual, regex.as_str()),
                    actual,
                ),
                _ => ValidationResult::invalid(
                    format!(
                        "({}) is not a string, cannot match ({})",
                        actual,
                        regex.as_str()
                    ),
                    actual,
                ),
            },
            Matcher::Contains(expected) => match actual {
                Value::Dictionary(dict) => {
                    for (key, matcher) in expected {
                        let Some(value) = dict.get(key) else {
                            return ValidationResult::invalid(
                                format!("key '{}' not found in '{}'", key, actual),
                                actual,
                            );
                        };
                        let result = matcher.validate(value);
                        if !result.is_valid() {
                            return result;
                        }
                    }
                    ValidationResult::Valid
                }
                _ => ValidationResult::invalid(
                    format!("({}) is not a dictionary", actual),
                    actual,
                ),
            },
            Matcher::Indexed(expected) => match actual {
                Value::Array(items) => {
                    for (index, matcher) in expected {
                        let Some(resolved) = resolve_index(items.len(), *index) else {
                            return ValidationResult::invalid(
                                format!(
                                    "index {} out of bounds for array of length {}",
                                    index,
                                    items.len()
                                ),
                                actual,
                            );
                        };
                        let result = matcher.validate(&items[resolved]);
                        if !result.is_valid() {
                            return result;
                        }
                    }
                    ValidationResult::Valid
                }
                // integer-looking keys of a dictionary
                Value::Dictionary(dict) => {
                    for (index, matcher) in expected {
                        let key = index.to_string();
                        let Some(value) = dict.get(&key) else {
                            return ValidationResult::invalid(
                                format!("key '{}' not found in '{}'", key, actual),
                                actual,
                            );
                        };
                        let result = matcher.validate(value);
                        if !result.is_valid() {
                            return result;
                        }
                    }
                    ValidationResult::Valid
                }
                _ => ValidationResult::invalid(format!("({}) is not an array", actual), actual),
            },
            Matcher::Elements(expected) => match actual {
                Value::Array(items) if items.len() == expected.len() => {
                    for (matcher, item) in expected.iter().zip(items) {
                        let result = matcher.validate(item);
                        if !result.is_valid() {
                            return result;
                        }
                    }
                    ValidationResult::Valid
                }
                Value::Array(items) => ValidationResult::invalid(
                    format!(
                        "array length {} is not equal to expected length {}",
                        items.len(),
                        expected.len()
                    ),
                    actual,
                ),
                _ => ValidationResult::invalid(format!("({}) is not an array", actual), actual),
            },
        }
    }
}

/// Compiles `pattern` and validates `actual` against it.
///
/// An uncompilable pattern is reported as an invalid result.
pub fn validate(pattern: &Value, actual: &Value) -> ValidationResult {
    match Matcher::compile(pattern) {
        Ok(matcher) => matcher.validate(actual),
        Err(e) => ValidationResult::invalid(e.to_string(), actual),
    }
}
