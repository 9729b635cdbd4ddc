//! Native HTTP client backed by reqwest.

use super::{EncodedBody, HttpCall, HttpClient, RequestError};
use crate::models::{HttpMethod, Response};
use async_trait::async_trait;
use indexmap::IndexMap;
use std::time::Instant;

/// Executes calls with reqwest.
///
/// reqwest clients are configured per call here because timeout and
/// certificate validation travel with the call.
#[derive(Debug, Clone, Default)]
pub struct NativeClient;

impl NativeClient {
    pub fn new() -> Self {
        Self
    }

    fn client_for(call: &HttpCall) -> Result<reqwest::Client, RequestError> {
        reqwest::Client::builder()
            .timeout(call.timeout)
            .danger_accept_invalid_certs(!call.validate_certificate)
            .build()
            .map_err(|e| RequestError::BuildError(e.to_string()))
    }
}

fn to_reqwest_method(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::GET => reqwest::Method::GET,
        HttpMethod::POST => reqwest::Method::POST,
        HttpMethod::PUT => reqwest::Method::PUT,
        HttpMethod::DELETE => reqwest::Method::DELETE,
        HttpMethod::PATCH => reqwest::Method::PATCH,
        HttpMethod::HEAD => reqwest::Method::HEAD,
        HttpMethod::OPTIONS => reqwest::Method::OPTIONS,
    }
}

/// Flattens a header map, joining repeated fields with `", "`.
///
/// Values that are not visible ASCII are dropped.
fn collect_headers(map: &reqwest::header::HeaderMap) -> IndexMap<String, String> {
    let mut headers: IndexMap<String, String> = IndexMap::new();
    for (name, value) in map {
        let Ok(value) = value.to_str() else {
            continue;
        };
        headers
            .entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(value);
            })
            .or_insert_with(|| value.to_string());
    }
    headers
}

#[async_trait]
impl HttpClient for NativeClient {
    async fn execute(&self, call: HttpCall) -> Result<Response, RequestError> {
        let client = Self::client_for(&call)?;
        let mut req_builder = client.request(to_reqwest_method(call.method), call.url.clone());

        for (name, value) in &call.headers {
            req_builder = req_builder.header(name.as_str(), value.as_str());
        }

        if let Some(body) = call.body.clone() {
            if let Some(content_type) = body.content_type() {
                if call.header("content-type").is_none() {
                    req_builder = req_builder.header(reqwest::header::CONTENT_TYPE, content_type);
                }
            }
            req_builder = match body {
                EncodedBody::Json(bytes) => req_builder.body(bytes),
                EncodedBody::Form(text) | EncodedBody::Text(text) => req_builder.body(text),
                EncodedBody::Multipart(parts) => {
                    let form = parts
                        .into_iter()
                        .fold(reqwest::multipart::Form::new(), |form, (name, value)| {
                            form.text(name, value)
                        });
                    req_builder.multipart(form)
                }
            };
        }

        log::debug!("{} {}", call.method, call.url);
        let start_time = Instant::now();

        let response = req_builder.send().await.map_err(|e| {
            if e.is_connect() {
                RequestError::NetworkError(format!("Connection failed: {}", e))
            } else {
                RequestError::from(e)
            }
        })?;

        let status = response.status().as_u16();

        let headers = collect_headers(response.headers());

        let body = response.bytes().await.map_err(RequestError::from)?.to_vec();
        let elapsed = start_time.elapsed();

        log::debug!("{} {} -> {} in {:?}", call.method, call.url, status, elapsed);

        Ok(Response::new(status, headers, body, elapsed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use url::Url;

    fn call(url: &str) -> HttpCall {
        HttpCall {
            method: HttpMethod::GET,
            url: Url::parse(url).unwrap(),
            headers: Vec::new(),
            body: None,
            timeout: Duration::from_secs(2),
            validate_certificate: true,
        }
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_error() {
        let result = NativeClient::new().execute(call("http://127.0.0.1:1/")).await;
        assert!(matches!(result, Err(RequestError::NetworkError(_))));
    }

    #[test]
    fn test_repeated_headers_are_joined() {
        use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, SET_COOKIE};

        let mut map = HeaderMap::new();
        map.append(SET_COOKIE, HeaderValue::from_static("a=1"));
        map.append(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        map.append(SET_COOKIE, HeaderValue::from_static("b=2"));

        let headers = collect_headers(&map);
        assert_eq!(headers.len(), 2);
        assert_eq!(headers["set-cookie"], "a=1, b=2");
        assert_eq!(headers["content-type"], "text/plain");
    }

    #[test]
    fn test_method_mapping() {
        assert_eq!(to_reqwest_method(HttpMethod::PATCH), reqwest::Method::PATCH);
        assert_eq!(to_reqwest_method(HttpMethod::HEAD), reqwest::Method::HEAD);
    }
}
