//! Request chaining integration tests
//!
//! These tests run suites against a mock server and verify that captured
//! responses, declared variables and the environment feed later requests.

use super::run_suite;
use rester::models::Value;
use rester::pipeline::Outcome;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_captured_json_feeds_later_url() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/post"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"values": ["a", 42, "c"]})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/anything/42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let yaml = r#"
requests:
  post-array:
    url: ${BASE}/post
    method: POST
    body:
      json:
        values: [a, 42, c]
    validation:
      status: 200
      json:
        values:
          0: a
          -1: c
  reference:
    url: ${BASE}/anything/${post-array.json.values[1]}
    validation:
      status: 200
      json:
        ok: true
"#;

    let report = run_suite(yaml, &server.uri()).await;

    assert_eq!(
        report.results(),
        vec![("post-array", Outcome::Success), ("reference", Outcome::Success)]
    );
    assert_eq!(
        report
            .context
            .resolve("post-array.json.values[-1]")
            .unwrap(),
        Value::from("c")
    );
}

#[tokio::test]
async fn test_reference_declared_first_is_unresolved() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/post"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"values": ["a", 42, "c"]})))
        .mount(&server)
        .await;

    let yaml = r#"
requests:
  reference:
    url: ${BASE}/anything/${post-array.json.values[1]}
  post-array:
    url: ${BASE}/post
    method: POST
"#;

    let report = run_suite(yaml, &server.uri()).await;

    assert_eq!(report.outcomes[0].outcome, Outcome::Failure);
    assert_eq!(
        report.outcomes[0].result.message(),
        Some("Unresolved reference: post-array.json.values[1]")
    );
    assert_eq!(report.outcomes[1].outcome, Outcome::Success);
}

#[tokio::test]
async fn test_environment_and_captured_headers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(
            ResponseTemplate::new(201)
                .insert_header("X-Session", "s-123")
                .set_body_json(json!({"token": "t-456"})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/profile"))
        .and(header("Authorization", "Bearer t-456"))
        .and(header("X-Session", "s-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "ada"})))
        .expect(1)
        .mount(&server)
        .await;

    let yaml = r#"
requests:
  login:
    url: ${BASE}/login
    method: POST
    validation:
      status: 201
  profile:
    url: ${BASE}/profile
    headers:
      Authorization: Bearer ${login.json.token}
      X-Session: ${login.headers.X-Session}
    validation:
      json:
        name: .regex(^a)
"#;

    let report = run_suite(yaml, &server.uri()).await;
    assert_eq!(report.summary().failed, 0, "{:?}", report.outcomes);
}

#[tokio::test]
async fn test_append_directive_only_affects_one_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/numbers"))
        .and(body_json(json!({"numbers": [1, 2, 3, 4]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"appended": true})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/numbers"))
        .and(body_json(json!({"numbers": [1, 3]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"removed": true})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/numbers"))
        .and(body_json(json!({"numbers": [1, 2, 3]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"plain": true})))
        .expect(1)
        .mount(&server)
        .await;

    let yaml = r#"
variables:
  numbers: [1, 2, 3]
requests:
  append:
    url: ${BASE}/numbers
    method: POST
    body:
      json:
        numbers: ${numbers}
    variables:
      numbers: .append(4)
    validation:
      json:
        appended: true
  remove:
    url: ${BASE}/numbers
    method: POST
    body:
      json:
        numbers: ${numbers}
    variables:
      numbers: .remove(2)
    validation:
      json:
        removed: true
  plain:
    url: ${BASE}/numbers
    method: POST
    body:
      json:
        numbers: ${numbers}
    validation:
      json:
        plain: true
"#;

    let report = run_suite(yaml, &server.uri()).await;
    assert_eq!(report.summary().failed, 0, "{:?}", report.outcomes);
    assert_eq!(
        report.context.resolve("numbers").unwrap(),
        Value::from(json!([1, 2, 3]))
    );
}

#[tokio::test]
async fn test_failed_request_cascades_but_run_continues() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"error": "denied"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let yaml = r#"
requests:
  login:
    url: ${BASE}/login
    method: POST
    validation:
      status: 200
  profile:
    url: ${BASE}/profile/${login.json.id}
  health:
    url: ${BASE}/health
"#;

    let report = run_suite(yaml, &server.uri()).await;
    assert_eq!(
        report.results(),
        vec![
            ("login", Outcome::Failure),
            ("profile", Outcome::Failure),
            ("health", Outcome::Success),
        ]
    );
    assert_eq!(
        report.outcomes[0].result.message(),
        Some("status invalid: (401) is not equal to (200)")
    );
    assert_eq!(report.summary().exit_code(), 1);
}
