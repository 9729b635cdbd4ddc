//! End-to-end integration tests
//!
//! Suites are loaded from files, run through the native client against a
//! mock server and reported through the console reporter.

use super::{environment, init_test_env, native_pipeline, run_suite};
use rester::pipeline::{ConsoleReporter, Outcome, StandardLogSink};
use rester::suite::{Suite, SuiteError};
use serde_json::json;
use std::fs;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{body_string, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Helper to write a suite file into a temporary directory
fn write_suite(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let file_path = dir.path().join(name);
    fs::write(&file_path, content).expect("Failed to write suite file");
    file_path
}

#[tokio::test]
async fn test_suite_file_runs_in_order_with_reporting() {
    init_test_env();
    let server = MockServer::start().await;
    for name in ["first", "second", "third"] {
        Mock::given(method("GET"))
            .and(path(format!("/{}", name)))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"name": name}))
                    .set_delay(Duration::from_millis(if name == "first" { 100 } else { 0 })),
            )
            .mount(&server)
            .await;
    }

    let temp_dir = TempDir::new().unwrap();
    let file = write_suite(
        &temp_dir,
        "order.yml",
        r#"
requests:
  first:
    url: ${BASE}/first
    validation:
      json:
        name: first
  second:
    url: ${BASE}/second
    validation:
      json:
        name: second
  3rd:
    url: ${BASE}/third
    validation:
      json:
        name: wrong
"#,
    );

    let suite = Suite::load(&file).unwrap();
    let mut reporter = ConsoleReporter::new(Vec::new(), false);
    let report = native_pipeline(5)
        .run(
            &suite.requests,
            suite.context(environment(&server.uri())),
            &mut reporter,
            true,
        )
        .await;

    assert_eq!(
        report.results(),
        vec![
            ("first", Outcome::Success),
            ("second", Outcome::Success),
            ("3rd", Outcome::Failure),
        ]
    );
    assert_eq!(report.summary().to_string(), "Executed 3 tests, 1 failed");

    let output = String::from_utf8(reporter.into_inner()).unwrap();
    let first = output.find("first started").unwrap();
    let second = output.find("second started").unwrap();
    let third = output.find("3rd started").unwrap();
    assert!(first < second && second < third);
    assert!(output.contains("❌  3rd FAILED : json invalid: (third) is not equal to (wrong)"));
}

#[tokio::test]
async fn test_form_body_and_query() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/form"))
        .and(query_param("page", "2"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string("value1=v1+foo&value2=10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"form": "ok"})))
        .expect(1)
        .mount(&server)
        .await;

    let yaml = r#"
variables:
  amount: 10
requests:
  form:
    url: ${BASE}/form
    method: POST
    query:
      page: 2
    body:
      form:
        value1: v1 foo
        value2: ${amount}
    validation:
      status: 200
      headers:
        CONTENT-TYPE: .regex(json)
"#;

    let report = run_suite(yaml, &server.uri()).await;
    assert_eq!(report.summary().failed, 0, "{:?}", report.outcomes);
}

#[tokio::test]
async fn test_status_reported_before_json() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "nope"})))
        .mount(&server)
        .await;

    let yaml = r#"
requests:
  missing:
    url: ${BASE}/missing
    validation:
      status: 200
      json:
        id: true
"#;

    let report = run_suite(yaml, &server.uri()).await;
    assert_eq!(
        report.outcomes[0].result.message(),
        Some("status invalid: (404) is not equal to (200)")
    );
}

#[tokio::test]
async fn test_json_pattern_against_non_json_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/html"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .mount(&server)
        .await;

    let yaml = r#"
requests:
  html:
    url: ${BASE}/html
    validation:
      json:
        title: true
"#;

    let report = run_suite(yaml, &server.uri()).await;
    assert_eq!(
        report.outcomes[0].result.message(),
        Some("failed to decode JSON object from response")
    );
}

#[tokio::test]
async fn test_timeout_fails_only_that_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/fast"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let suite = Suite::from_yaml(
        "requests:\n  slow:\n    url: ${BASE}/slow\n  fast:\n    url: ${BASE}/fast\n",
    )
    .unwrap();
    let report = native_pipeline(1)
        .run(
            &suite.requests,
            suite.context(environment(&server.uri())),
            &mut rester::pipeline::SilentObserver,
            true,
        )
        .await;

    assert_eq!(
        report.results(),
        vec![("slow", Outcome::Failure), ("fast", Outcome::Success)]
    );
    assert_eq!(report.outcomes[0].result.message(), Some("Request timed out"));
}

#[tokio::test]
async fn test_log_file_written_to_work_dir() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/anything"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"url": format!("{}/anything", server.uri())})),
        )
        .mount(&server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let suite = Suite::from_yaml(
        "requests:\n  request:\n    url: ${BASE}/anything\n    log: .file(log.txt)\n",
    )
    .unwrap();
    let pipeline =
        native_pipeline(5).with_log_sink(Arc::new(StandardLogSink::new(temp_dir.path())));

    let report = pipeline
        .run(
            &suite.requests,
            suite.context(environment(&server.uri())),
            &mut rester::pipeline::SilentObserver,
            true,
        )
        .await;

    assert_eq!(report.summary().failed, 0);
    let log = fs::read_to_string(temp_dir.path().join("log.txt")).expect("log file must exist");
    assert!(log.contains("\"url\": \""), "logfile was: {}", log);
    assert!(log.contains("/anything"));
}

#[test]
fn test_suite_without_requests_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let file = write_suite(&temp_dir, "empty.yml", "variables:\n  a: 1\n");
    assert!(matches!(Suite::load(&file), Err(SuiteError::NoRequests)));
}
