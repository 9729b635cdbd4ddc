//! Array mutation directives for request-local variable overrides.
//!
//! A request may override an array-valued variable with `.append(x)` or
//! `.remove(x)`. The request then sees a copy of the array with `x` appended,
//! or with the first element equal to `x` removed. The declared variable is
//! never changed.

use crate::models::{Dictionary, Value};
use once_cell::sync::Lazy;
use regex::Regex;

static DIRECTIVE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\.(append|remove)\((.*)\)$").expect("Failed to compile mutation directive regex")
});

/// A parsed mutation directive.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    Append(Value),
    Remove(Value),
}

impl Mutation {
    /// Parses `.append(x)` / `.remove(x)`; any other value is not a directive.
    ///
    /// `x` becomes an `Int` if it parses as one, then a `Double`, otherwise a
    /// `String`.
    pub fn parse(value: &Value) -> Option<Mutation> {
        let text = value.as_str()?.trim();
        let caps = DIRECTIVE_REGEX.captures(text)?;
        let operand = parse_operand(caps.get(2)?.as_str());
        match caps.get(1)?.as_str() {
            "append" => Some(Mutation::Append(operand)),
            "remove" => Some(Mutation::Remove(operand)),
            _ => None,
        }
    }

    /// Applies the directive to a copy of `items`.
    ///
    /// Removing a value that is not present is a no-op.
    pub fn apply(&self, items: &[Value]) -> Vec<Value> {
        let mut result = items.to_vec();
        match self {
            Mutation::Append(value) => result.push(value.clone()),
            Mutation::Remove(value) => {
                let target = value.to_string();
                // "4" in the array matches .remove(4)
                if let Some(idx) = result
                    .iter()
                    .position(|item| item == value || item.to_string() == target)
                {
                    result.remove(idx);
                }
            }
        }
        result
    }
}

fn parse_operand(raw: &str) -> Value {
    let raw = raw.trim();
    if let Ok(i) = raw.parse::<i64>() {
        Value::Int(i)
    } else if let Ok(d) = raw.parse::<f64>() {
        Value::Double(d)
    } else {
        Value::String(raw.to_string())
    }
}

/// Merges request-local `overrides` over `variables`, returning a new mapping.
///
/// Directives apply to array-valued variables; a directive aimed at a missing
/// or non-array variable is ignored. Any other override replaces the variable.
pub fn apply_overrides(variables: &Dictionary, overrides: &Dictionary) -> Dictionary {
    let mut result = variables.clone();
    for (key, value) in overrides {
        match Mutation::parse(value) {
            Some(mutation) => match variables.get(key) {
                Some(Value::Array(items)) => {
                    result.insert(key.clone(), Value::Array(mutation.apply(items)));
                }
                _ => {
                    log::warn!(
                        "ignoring mutation directive for '{}': not an array variable",
                        key
                    );
                }
            },
            None => {
                result.insert(key.clone(), value.clone());
            }
        }
    }
    result
}
