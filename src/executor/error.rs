//! Request execution error types.
//!
//! Every error here fails the request it occurred in. None of them abort a
//! pipeline run.

use crate::variables::VarError;
use std::fmt;

/// Errors that can occur while preparing or executing one request.
#[derive(Debug)]
pub enum RequestError {
    /// A template placeholder could not be resolved.
    Substitution(VarError),

    /// The URL does not parse after substitution.
    InvalidUrl(String),

    /// Only http and https are supported.
    UnsupportedProtocol(String),

    /// The body could not be serialized.
    EncodingError(String),

    /// The delay does not fit in a `Duration`.
    InvalidDelay(f64),

    /// Connection failures, DNS resolution errors and other network issues.
    NetworkError(String),

    /// The request did not complete within the configured timeout.
    Timeout,

    /// Certificate validation, handshake and other TLS failures.
    TlsError(String),

    /// The HTTP client could not be built.
    BuildError(String),
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestError::Substitution(err) => write!(f, "{}", err),
            RequestError::InvalidUrl(url) => write!(f, "Invalid URL: {}", url),
            RequestError::UnsupportedProtocol(protocol) => {
                write!(f, "Unsupported protocol: {}", protocol)
            }
            RequestError::EncodingError(msg) => write!(f, "Encoding error: {}", msg),
            RequestError::InvalidDelay(seconds) => write!(f, "Invalid delay: {}s", seconds),
            RequestError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            RequestError::Timeout => write!(f, "Request timed out"),
            RequestError::TlsError(msg) => write!(f, "TLS/SSL error: {}", msg),
            RequestError::BuildError(msg) => write!(f, "Request build error: {}", msg),
        }
    }
}

impl std::error::Error for RequestError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RequestError::Substitution(err) => Some(err),
            _ => None,
        }
    }
}

impl From<VarError> for RequestError {
    fn from(err: VarError) -> Self {
        RequestError::Substitution(err)
    }
}

/// Maps reqwest's error kinds onto our variants.
impl From<reqwest::Error> for RequestError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            RequestError::Timeout
        } else if err.is_builder() {
            RequestError::BuildError(err.to_string())
        } else if err.to_string().contains("certificate")
            || err.to_string().contains("TLS")
            || err.to_string().contains("SSL")
        {
            RequestError::TlsError(err.to_string())
        } else {
            RequestError::NetworkError(err.to_string())
        }
    }
}

impl From<url::ParseError> for RequestError {
    fn from(err: url::ParseError) -> Self {
        RequestError::InvalidUrl(err.to_string())
    }
}
