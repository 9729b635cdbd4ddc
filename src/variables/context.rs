//! Variable context for placeholder resolution.
//!
//! The root segment of a placeholder path is looked up in three layers, in
//! priority order:
//!
//! 1. Captured responses, keyed by request name (`status`, `headers`, `json`)
//! 2. Declared suite variables
//! 3. Environment values
//!
//! The remaining segments navigate the value found there.

use super::mutation::apply_overrides;
use super::VarError;
use crate::models::{parse_path, Dictionary, PathSegment, Response, Value};
use indexmap::IndexMap;
use std::borrow::Cow;
use std::collections::HashMap;

/// Resolution scope for `${...}` placeholders.
///
/// Built once per pipeline run. Only the pipeline mutates it, by capturing
/// each successful response under its request name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VariableContext {
    /// Captured responses, in capture order.
    responses: IndexMap<String, Value>,

    /// Declared suite variables.
    variables: Dictionary,

    /// Environment fallback values.
    environment: HashMap<String, String>,
}

impl VariableContext {
    /// Creates a context from declared variables and environment values.
    pub fn new(variables: Dictionary, environment: HashMap<String, String>) -> Self {
        Self {
            responses: IndexMap::new(),
            variables,
            environment,
        }
    }

    pub fn variables(&self) -> &Dictionary {
        &self.variables
    }

    pub fn environment(&self) -> &HashMap<String, String> {
        &self.environment
    }

    /// Returns the captured response value stored under `name`.
    pub fn captured(&self, name: &str) -> Option<&Value> {
        self.responses.get(name)
    }

    /// Names of captured responses, in capture order.
    pub fn captured_names(&self) -> impl Iterator<Item = &str> {
        self.responses.keys().map(|k| k.as_str())
    }

    /// Stores `response` under `name` for later requests.
    ///
    /// A capture is immutable once made: returns `false` and keeps the
    /// existing entry if `name` was already captured.
    pub fn capture(&mut self, name: &str, response: &Response) -> bool {
        if self.responses.contains_key(name) {
            log::warn!("response '{}' already captured, keeping the first", name);
            return false;
        }
        self.responses.insert(name.to_string(), response.to_value());
        true
    }

    /// Resolves a placeholder path to a value.
    ///
    /// # Errors
    ///
    /// - `VarError::InvalidPath` if the path is malformed
    /// - `VarError::UnresolvedReference` if the root or any later segment is missing
    pub fn resolve(&self, path: &str) -> Result<Value, VarError> {
        let segments = parse_path(path).ok_or_else(|| VarError::InvalidPath(path.to_string()))?;
        let (root, rest) = match segments.split_first() {
            Some((PathSegment::Key(root), rest)) => (root, rest),
            _ => return Err(VarError::InvalidPath(path.to_string())),
        };

        let root_value = self
            .lookup_root(root)
            .ok_or_else(|| VarError::UnresolvedReference(path.to_string()))?;

        let resolved = match rest {
            [PathSegment::Key(field), PathSegment::Key(header), tail @ ..]
                if field == "headers" && self.responses.contains_key(root) =>
            {
                captured_header(&root_value, header).and_then(|value| value.get_segments(tail))
            }
            _ => root_value.get_segments(rest),
        };

        resolved
            .cloned()
            .ok_or_else(|| VarError::UnresolvedReference(path.to_string()))
    }

    fn lookup_root(&self, name: &str) -> Option<Cow<'_, Value>> {
        if let Some(value) = self.responses.get(name) {
            return Some(Cow::Borrowed(value));
        }
        if let Some(value) = self.variables.get(name) {
            return Some(Cow::Borrowed(value));
        }
        self.environment
            .get(name)
            .map(|value| Cow::Owned(Value::String(value.clone())))
    }

    /// Returns the context a single request should see.
    ///
    /// Request-local overrides (including `.append(x)`/`.remove(x)` mutation
    /// directives) apply to a copy; `self` is never changed.
    pub fn scoped(&self, overrides: &Dictionary) -> Cow<'_, VariableContext> {
        if overrides.is_empty() {
            return Cow::Borrowed(self);
        }
        let mut scoped = self.clone();
        scoped.variables = apply_overrides(&self.variables, overrides);
        Cow::Owned(scoped)
    }

    /// Copy of this context keeping only the captures listed in `names`.
    ///
    /// Used to seed repeat runs with the results of setup-only requests.
    pub fn retain_captures(&self, names: &[String]) -> VariableContext {
        VariableContext {
            responses: self
                .responses
                .iter()
                .filter(|(name, _)| names.contains(*name))
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect(),
            variables: self.variables.clone(),
            environment: self.environment.clone(),
        }
    }
}

/// Header names of a captured response match case-insensitively.
fn captured_header<'a>(response: &'a Value, name: &str) -> Option<&'a Value> {
    response
        .get("headers")?
        .as_dictionary()?
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value)
}
