//! HTTP request execution.
//!
//! The pipeline never talks to the network directly. It turns a substituted
//! [`Request`] into an [`HttpCall`] and hands it to an [`HttpClient`]
//! implementation. [`NativeClient`] is the reqwest-backed one; tests plug in
//! their own.

pub mod body;
pub mod config;
pub mod error;
pub mod native;

pub use body::{encode_body, EncodedBody};
pub use config::ExecutionConfig;
pub use error::RequestError;
pub use native::NativeClient;

use crate::models::{HttpMethod, Request, Response};
use async_trait::async_trait;
use std::time::Duration;
use url::Url;

/// A fully prepared HTTP call.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpCall {
    pub method: HttpMethod,
    /// URL with the query mapping already appended.
    pub url: Url,
    /// Default headers merged with request headers, request wins.
    pub headers: Vec<(String, String)>,
    pub body: Option<EncodedBody>,
    pub timeout: Duration,
    pub validate_certificate: bool,
}

impl HttpCall {
    /// Looks up a header value, case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Performs HTTP calls.
///
/// Implementations report transport problems as `RequestError`; any HTTP
/// status, including 4xx and 5xx, is a successful call.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, call: HttpCall) -> Result<Response, RequestError>;
}

/// Builds the call for an already substituted request.
///
/// # Errors
///
/// Returns `RequestError::InvalidUrl` or `RequestError::UnsupportedProtocol`
/// for a bad URL, and `RequestError::EncodingError` if the body cannot be
/// encoded.
pub fn build_call(request: &Request, config: &ExecutionConfig) -> Result<HttpCall, RequestError> {
    let mut url = Url::parse(request.url.trim())
        .map_err(|e| RequestError::InvalidUrl(format!("{} ({})", request.url, e)))?;

    match url.scheme() {
        "http" | "https" => {}
        other => return Err(RequestError::UnsupportedProtocol(other.to_string())),
    }

    if !request.query.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (key, value) in &request.query {
            pairs.append_pair(key, &value.to_string());
        }
    }

    let mut headers: Vec<(String, String)> = Vec::new();
    let mut defaults: Vec<(&String, &String)> = config.default_headers.iter().collect();
    defaults.sort();
    for (name, value) in defaults {
        if !request.headers.keys().any(|k| k.eq_ignore_ascii_case(name)) {
            headers.push((name.clone(), value.clone()));
        }
    }
    for (name, value) in &request.headers {
        headers.push((name.clone(), value.to_string()));
    }

    let body = match &request.body {
        Some(body) if request.method.allows_body() => Some(encode_body(body)?),
        Some(_) => {
            log::debug!(
                "Ignoring body of {} request '{}'",
                request.method,
                request.name
            );
            None
        }
        None => None,
    };

    Ok(HttpCall {
        method: request.method,
        url,
        headers,
        body,
        timeout: config.timeout_duration(),
        validate_certificate: config.validate_certificate,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Body, Value};
    use serde_json::json;
    use std::collections::HashMap;

    fn config() -> ExecutionConfig {
        let mut config = ExecutionConfig::new(5);
        config
            .default_headers
            .insert("User-Agent".to_string(), "rester-test".to_string());
        config
    }

    #[test]
    fn test_query_is_appended() {
        let mut request = Request::new("q", "http://localhost:8080/get?a=1");
        request.query.insert("b".to_string(), Value::Int(2));
        request.query.insert("c".to_string(), Value::from("x y"));

        let call = build_call(&request, &config()).unwrap();
        assert_eq!(call.url.as_str(), "http://localhost:8080/get?a=1&b=2&c=x+y");
    }

    #[test]
    fn test_request_headers_override_defaults() {
        let request = Request::new("h", "http://localhost/").with_header("user-agent", "mine");
        let call = build_call(&request, &config()).unwrap();
        assert_eq!(call.headers, vec![("user-agent".to_string(), "mine".to_string())]);

        let request = Request::new("h", "http://localhost/");
        let call = build_call(&request, &config()).unwrap();
        assert_eq!(call.header("USER-AGENT"), Some("rester-test"));
    }

    #[test]
    fn test_body_dropped_for_get_and_head() {
        let body = Body::Json(Value::from(json!({"a": 1})));
        let request = Request::new("g", "http://localhost/").with_body(body.clone());
        assert!(build_call(&request, &config()).unwrap().body.is_none());

        let request = Request::new("h", "http://localhost/")
            .with_method(HttpMethod::HEAD)
            .with_body(body.clone());
        assert!(build_call(&request, &config()).unwrap().body.is_none());

        let request = Request::new("d", "http://localhost/")
            .with_method(HttpMethod::DELETE)
            .with_body(body);
        assert!(build_call(&request, &config()).unwrap().body.is_some());
    }

    #[test]
    fn test_invalid_urls() {
        let request = Request::new("bad", "not a url");
        assert!(matches!(
            build_call(&request, &config()),
            Err(RequestError::InvalidUrl(_))
        ));

        let request = Request::new("ftp", "ftp://example.com/file");
        assert!(matches!(
            build_call(&request, &config()),
            Err(RequestError::UnsupportedProtocol(p)) if p == "ftp"
        ));
    }

    #[test]
    fn test_timeout_and_tls_forwarded() {
        let config = ExecutionConfig {
            timeout_secs: 9,
            validate_certificate: false,
            default_headers: HashMap::new(),
        };
        let call = build_call(&Request::new("t", "https://localhost/"), &config).unwrap();
        assert_eq!(call.timeout, Duration::from_secs(9));
        assert!(!call.validate_certificate);
    }
}
