//! Captured HTTP responses.

use super::value::{Dictionary, Value};
use indexmap::IndexMap;
use std::time::Duration;

/// A response as captured at runtime.
///
/// The body is kept as raw bytes; `json` holds the decoded body when it is
/// valid JSON and is `None` otherwise.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// HTTP status code.
    pub status: u16,

    /// Response headers in the order the server sent them.
    pub headers: IndexMap<String, String>,

    /// Raw response body.
    pub body: Vec<u8>,

    /// Decoded JSON body, if the body parsed as JSON.
    pub json: Option<Value>,

    /// Time from sending the request to receiving the complete body.
    pub elapsed: Duration,
}

impl Response {
    /// Creates a response and decodes its body as JSON when possible.
    pub fn new(
        status: u16,
        headers: IndexMap<String, String>,
        body: Vec<u8>,
        elapsed: Duration,
    ) -> Self {
        let json = decode_json(&body);
        Self {
            status,
            headers,
            body,
            json,
            elapsed,
        }
    }

    /// Looks up a header value, case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Attempts to parse the response body as UTF-8 text.
    pub fn body_as_string(&self) -> Result<String, std::string::FromUtf8Error> {
        String::from_utf8(self.body.clone())
    }

    /// Header mapping as a `Value::Dictionary`.
    pub fn headers_value(&self) -> Value {
        Value::Dictionary(
            self.headers
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect(),
        )
    }

    /// The fields later requests may reference: `status`, `headers` and,
    /// when the body decoded, `json`.
    pub fn to_value(&self) -> Value {
        let mut fields = Dictionary::new();
        fields.insert("status".to_string(), Value::Int(self.status as i64));
        fields.insert("headers".to_string(), self.headers_value());
        if let Some(json) = &self.json {
            fields.insert("json".to_string(), json.clone());
        }
        Value::Dictionary(fields)
    }
}

fn decode_json(body: &[u8]) -> Option<Value> {
    if body.iter().all(|b| b.is_ascii_whitespace()) {
        return None;
    }
    match serde_json::from_slice::<Value>(body) {
        Ok(value) => Some(value),
        Err(e) => {
            log::debug!("response body is not JSON: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers() -> IndexMap<String, String> {
        let mut headers = IndexMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        headers
    }

    #[test]
    fn test_json_body_is_decoded() {
        let response = Response::new(
            200,
            headers(),
            br#"{"values": ["a", 42]}"#.to_vec(),
            Duration::from_millis(12),
        );
        let json = response.json.as_ref().unwrap();
        assert_eq!(json.get("values[1]"), Some(&Value::Int(42)));
    }

    #[test]
    fn test_non_json_body() {
        let response = Response::new(200, headers(), b"<html/>".to_vec(), Duration::ZERO);
        assert!(response.json.is_none());
        assert_eq!(response.body_as_string().unwrap(), "<html/>");

        let empty = Response::new(204, IndexMap::new(), Vec::new(), Duration::ZERO);
        assert!(empty.json.is_none());
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let response = Response::new(200, headers(), Vec::new(), Duration::ZERO);
        assert_eq!(response.header("content-type"), Some("application/json"));
        assert_eq!(response.content_type(), Some("application/json"));
        assert_eq!(response.header("x-missing"), None);
    }

    #[test]
    fn test_to_value() {
        let response = Response::new(201, headers(), br#"{"id": 7}"#.to_vec(), Duration::ZERO);
        let value = response.to_value();
        assert_eq!(value.get("status"), Some(&Value::Int(201)));
        assert_eq!(
            value.get("headers.Content-Type"),
            Some(&Value::from("application/json"))
        );
        assert_eq!(value.get("json.id"), Some(&Value::Int(7)));

        let text = Response::new(200, IndexMap::new(), b"ok".to_vec(), Duration::ZERO);
        assert_eq!(text.to_value().get("json"), None);
    }
}
