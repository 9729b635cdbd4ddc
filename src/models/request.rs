//! Request templates.
//!
//! A `Request` is one named entry of a suite: a templated URL, headers, query,
//! body and validation block. Templates are resolved against a
//! [`VariableContext`](crate::variables::VariableContext) right before the
//! request is executed.

use super::value::{Dictionary, Value};
use crate::variables::{substitute, substitute_text, VarError, VariableContext};
use serde::{Deserialize, Deserializer, Serialize};

/// HTTP request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
pub enum HttpMethod {
    #[default]
    GET,
    POST,
    PUT,
    DELETE,
    PATCH,
    OPTIONS,
    HEAD,
}

impl HttpMethod {
    /// Returns the string representation of the HTTP method.
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::GET => "GET",
            HttpMethod::POST => "POST",
            HttpMethod::PUT => "PUT",
            HttpMethod::DELETE => "DELETE",
            HttpMethod::PATCH => "PATCH",
            HttpMethod::OPTIONS => "OPTIONS",
            HttpMethod::HEAD => "HEAD",
        }
    }

    /// Parses a method name, case-insensitively.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "GET" => Some(HttpMethod::GET),
            "POST" => Some(HttpMethod::POST),
            "PUT" => Some(HttpMethod::PUT),
            "DELETE" => Some(HttpMethod::DELETE),
            "PATCH" => Some(HttpMethod::PATCH),
            "OPTIONS" => Some(HttpMethod::OPTIONS),
            "HEAD" => Some(HttpMethod::HEAD),
            _ => None,
        }
    }

    /// Whether a declared body is sent with this method.
    pub fn allows_body(&self) -> bool {
        !matches!(self, HttpMethod::GET | HttpMethod::HEAD)
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl<'de> Deserialize<'de> for HttpMethod {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        HttpMethod::from_str(&name)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown HTTP method '{}'", name)))
    }
}

/// Request body template.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "Value")]
pub enum Body {
    /// Sent as `application/json`.
    Json(Value),
    /// Sent as `application/x-www-form-urlencoded`.
    Form(Dictionary),
    /// Sent as `multipart/form-data` text parts.
    Multipart(Dictionary),
    /// Sent verbatim.
    Text(String),
}

impl TryFrom<Value> for Body {
    type Error = String;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let dict = match value {
            Value::Dictionary(dict) if dict.len() == 1 => dict,
            other => {
                return Err(format!(
                    "body must be a mapping with exactly one of json, form, multipart or text, got {}",
                    other
                ))
            }
        };
        let (kind, content) = dict.into_iter().next().ok_or("empty body")?;
        match (kind.as_str(), content) {
            ("json", content) => Ok(Body::Json(content)),
            ("form", Value::Dictionary(fields)) => Ok(Body::Form(fields)),
            ("multipart", Value::Dictionary(fields)) => Ok(Body::Multipart(fields)),
            ("text", Value::String(text)) => Ok(Body::Text(text)),
            ("form" | "multipart", other) => Err(format!(
                "{} body must be a mapping, got {}",
                kind,
                other.type_name()
            )),
            ("text", other) => Err(format!("text body must be a string, got {}", other.type_name())),
            (other, _) => Err(format!("unknown body kind '{}'", other)),
        }
    }
}

impl Body {
    fn substitute(&self, context: &VariableContext) -> Result<Body, VarError> {
        Ok(match self {
            Body::Json(value) => Body::Json(substitute(value, context)?),
            Body::Form(fields) => Body::Form(substitute_dictionary(fields, context)?),
            Body::Multipart(fields) => Body::Multipart(substitute_dictionary(fields, context)?),
            Body::Text(text) => Body::Text(substitute_text(text, context)?),
        })
    }
}

/// Expected-response patterns. Each aspect is optional.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct Validation {
    pub status: Option<Value>,
    pub headers: Option<Value>,
    pub json: Option<Value>,
}

impl Validation {
    fn substitute(&self, context: &VariableContext) -> Result<Validation, VarError> {
        let substitute_opt = |value: &Option<Value>| {
            value
                .as_ref()
                .map(|value| substitute(value, context))
                .transpose()
        };
        Ok(Validation {
            status: substitute_opt(&self.status)?,
            headers: substitute_opt(&self.headers)?,
            json: substitute_opt(&self.json)?,
        })
    }
}

/// Request details as they appear under a request name in a suite file.
#[derive(Debug, Clone, Deserialize)]
pub struct RequestDetails {
    pub url: String,
    #[serde(default)]
    pub method: HttpMethod,
    #[serde(default)]
    pub headers: Dictionary,
    #[serde(default)]
    pub query: Dictionary,
    pub body: Option<Body>,
    pub validation: Option<Validation>,
    pub delay: Option<Value>,
    pub log: Option<Value>,
    #[serde(default)]
    pub variables: Dictionary,
}

/// A named request template.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    /// Unique name within the suite; captured responses are stored under it.
    pub name: String,
    pub method: HttpMethod,
    /// URL template; query parameters are appended after substitution.
    pub url: String,
    pub headers: Dictionary,
    pub query: Dictionary,
    pub body: Option<Body>,
    pub validation: Option<Validation>,
    /// Seconds to wait before sending. May itself be a template.
    pub delay: Option<Value>,
    /// Log directive, forwarded to the log sink untouched.
    pub log: Option<Value>,
    /// Request-local variable overrides, including `.append(x)`/`.remove(x)`.
    pub variables: Dictionary,
    /// Setup-only requests are skipped on repeat runs.
    pub setup: bool,
}

impl Request {
    /// Creates a GET request with no headers, body or validation.
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            method: HttpMethod::GET,
            url: url.into(),
            headers: Dictionary::new(),
            query: Dictionary::new(),
            body: None,
            validation: None,
            delay: None,
            log: None,
            variables: Dictionary::new(),
            setup: false,
        }
    }

    pub fn from_details(name: impl Into<String>, details: RequestDetails) -> Self {
        Self {
            name: name.into(),
            method: details.method,
            url: details.url,
            headers: details.headers,
            query: details.query,
            body: details.body,
            validation: details.validation,
            delay: details.delay,
            log: details.log,
            variables: details.variables,
            setup: false,
        }
    }

    pub fn with_method(mut self, method: HttpMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_body(mut self, body: Body) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_validation(mut self, validation: Validation) -> Self {
        self.validation = Some(validation);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Resolves every templated field against `context`.
    ///
    /// The log directive and request-local variables are carried over as is.
    pub fn substitute(&self, context: &VariableContext) -> Result<Request, VarError> {
        Ok(Request {
            name: self.name.clone(),
            method: self.method,
            url: substitute_text(&self.url, context)?,
            headers: substitute_dictionary(&self.headers, context)?,
            query: substitute_dictionary(&self.query, context)?,
            body: self
                .body
                .as_ref()
                .map(|body| body.substitute(context))
                .transpose()?,
            validation: self
                .validation
                .as_ref()
                .map(|validation| validation.substitute(context))
                .transpose()?,
            delay: self
                .delay
                .as_ref()
                .map(|delay| substitute(delay, context))
                .transpose()?,
            log: self.log.clone(),
            variables: self.variables.clone(),
            setup: self.setup,
        })
    }

    /// Delay in seconds. Numeric strings are accepted, anything else is zero.
    pub fn delay_seconds(&self) -> f64 {
        let seconds = match &self.delay {
            Some(Value::Int(i)) => *i as f64,
            Some(Value::Double(d)) => *d,
            Some(Value::String(s)) => s.trim().parse::<f64>().unwrap_or(0.0),
            _ => 0.0,
        };
        if seconds.is_finite() && seconds > 0.0 {
            seconds
        } else {
            0.0
        }
    }
}

fn substitute_dictionary(
    fields: &Dictionary,
    context: &VariableContext,
) -> Result<Dictionary, VarError> {
    fields
        .iter()
        .map(|(key, value)| Ok((key.clone(), substitute(value, context)?)))
        .collect()
}
