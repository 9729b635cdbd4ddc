//! Request body encoding.
//!
//! Turns a substituted [`Body`] into what is put on the wire. Multipart byte
//! framing is left to the HTTP client; only the parts are computed here.

use super::RequestError;
use crate::models::{Body, Dictionary, Value};

/// A body ready to be sent.
#[derive(Debug, Clone, PartialEq)]
pub enum EncodedBody {
    Json(Vec<u8>),
    Form(String),
    Multipart(Vec<(String, String)>),
    Text(String),
}

impl EncodedBody {
    /// Content type implied by the encoding.
    ///
    /// `None` for multipart, whose boundary is chosen by the HTTP client.
    pub fn content_type(&self) -> Option<&'static str> {
        match self {
            EncodedBody::Json(_) => Some("application/json"),
            EncodedBody::Form(_) => Some("application/x-www-form-urlencoded"),
            EncodedBody::Multipart(_) => None,
            EncodedBody::Text(_) => Some("text/plain; charset=utf-8"),
        }
    }
}

/// Encodes a substituted body.
///
/// # Errors
///
/// `RequestError::EncodingError` if a JSON body cannot be serialized or a
/// multipart body has no parameters.
pub fn encode_body(body: &Body) -> Result<EncodedBody, RequestError> {
    match body {
        Body::Json(value) => serde_json::to_vec(value)
            .map(EncodedBody::Json)
            .map_err(|e| RequestError::EncodingError(e.to_string())),
        Body::Form(fields) => Ok(EncodedBody::Form(form_urlencoded(fields))),
        Body::Multipart(fields) => {
            if fields.is_empty() {
                return Err(RequestError::EncodingError(
                    "multipart encoding requires at least one parameter".to_string(),
                ));
            }
            let mut parts: Vec<(String, String)> = fields
                .iter()
                .map(|(key, value)| (key.clone(), field_text(value)))
                .collect();
            parts.sort_by(|a, b| a.0.cmp(&b.0));
            Ok(EncodedBody::Multipart(parts))
        }
        Body::Text(text) => Ok(EncodedBody::Text(text.clone())),
    }
}

fn form_urlencoded(fields: &Dictionary) -> String {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (key, value) in fields {
        serializer.append_pair(key, &field_text(value));
    }
    serializer.finish()
}

fn field_text(value: &Value) -> String {
    value.to_string()
}
