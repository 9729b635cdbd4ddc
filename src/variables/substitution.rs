//! Placeholder substitution engine.
//!
//! Replaces `${path}` placeholders inside a [`Value`] tree with values resolved
//! from a [`VariableContext`]:
//!
//! - a string that is exactly one placeholder becomes the resolved value with
//!   its variant intact (object, array, number, string)
//! - placeholders embedded in other text are replaced by the stringified
//!   value and the result is always a string
//! - dictionaries and arrays are descended recursively; keys are left as is
//!
//! Substitution is single-pass: resolved values are not scanned again.

use super::{VarError, VariableContext};
use crate::models::Value;
use once_cell::sync::Lazy;
use regex::Regex;

/// Cached regex pattern for matching `${path}` with optional whitespace.
static PLACEHOLDER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{([^}]+)\}").expect("Failed to compile placeholder regex"));

/// Substitutes every placeholder in `value`.
///
/// # Errors
///
/// Returns `VarError::UnresolvedReference` for the first placeholder whose
/// path cannot be fully resolved.
///
/// # Examples
///
/// ```
/// use rester::models::{Dictionary, Value};
/// use rester::variables::{substitute, VariableContext};
/// use std::collections::HashMap;
///
/// let mut variables = Dictionary::new();
/// variables.insert("id".to_string(), Value::Int(42));
/// let context = VariableContext::new(variables, HashMap::new());
///
/// assert_eq!(substitute(&Value::from("${id}"), &context).unwrap(), Value::Int(42));
/// assert_eq!(
///     substitute(&Value::from("item-${id}"), &context).unwrap(),
///     Value::from("item-42")
/// );
/// ```
pub fn substitute(value: &Value, context: &VariableContext) -> Result<Value, VarError> {
    match value {
        Value::String(text) => substitute_string(text, context),
        Value::Array(items) => items
            .iter()
            .map(|item| substitute(item, context))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Value::Dictionary(dict) => dict
            .iter()
            .map(|(key, item)| Ok((key.clone(), substitute(item, context)?)))
            .collect::<Result<_, VarError>>()
            .map(Value::Dictionary),
        Value::Null | Value::Bool(_) | Value::Int(_) | Value::Double(_) => Ok(value.clone()),
    }
}

/// Substitutes placeholders in a single string value.
///
/// A string consisting of exactly one placeholder resolves to the referenced
/// value unchanged in type.
pub fn substitute_string(text: &str, context: &VariableContext) -> Result<Value, VarError> {
    // Fast path: no placeholder markers at all
    if !text.contains("${") {
        return Ok(Value::String(text.to_string()));
    }

    if let Some(cap) = PLACEHOLDER_REGEX.captures(text) {
        let whole = cap.get(0).map(|m| (m.start(), m.end()));
        if whole == Some((0, text.len())) {
            return context.resolve(cap[1].trim());
        }
    }

    substitute_text(text, context).map(Value::String)
}

/// Substitutes placeholders in `text`, always producing a string.
///
/// Each placeholder is replaced by the `Display` form of its value.
pub fn substitute_text(text: &str, context: &VariableContext) -> Result<String, VarError> {
    if !text.contains("${") {
        return Ok(text.to_string());
    }

    let mut result = String::with_capacity(text.len() + (text.len() / 4));
    let mut last_match_end = 0;

    for cap in PLACEHOLDER_REGEX.captures_iter(text) {
        let full_match = match cap.get(0) {
            Some(m) => m,
            None => continue,
        };
        let path = cap[1].trim();

        result.push_str(&text[last_match_end..full_match.start()]);
        let resolved = context.resolve(path)?;
        result.push_str(&resolved.to_string());

        last_match_end = full_match.end();
    }

    result.push_str(&text[last_match_end..]);
    Ok(result)
}
