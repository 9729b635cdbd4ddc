//! Integration tests module for Rester
//!
//! Common helpers for running suites against wiremock servers.

pub mod end_to_end_test;
pub mod request_chaining_test;

use rester::executor::{ExecutionConfig, NativeClient};
use rester::pipeline::{Pipeline, RunReport, SilentObserver};
use rester::suite::Suite;
use std::collections::HashMap;
use std::sync::{Arc, Once};

static INIT: Once = Once::new();

/// Initialize test environment (run once)
pub fn init_test_env() {
    INIT.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

/// Pipeline with the native client and a short timeout.
pub fn native_pipeline(timeout_secs: u64) -> Pipeline {
    Pipeline::new(Arc::new(NativeClient::new()), ExecutionConfig::new(timeout_secs))
}

/// Environment exposing the mock server as `BASE`.
pub fn environment(base: &str) -> HashMap<String, String> {
    let mut env = HashMap::new();
    env.insert("BASE".to_string(), base.to_string());
    env
}

/// Parses `yaml` and runs it once against `base`.
pub async fn run_suite(yaml: &str, base: &str) -> RunReport {
    init_test_env();
    let suite = Suite::from_yaml(yaml).expect("Failed to parse suite");
    native_pipeline(5)
        .run(&suite.requests, suite.context(environment(base)), &mut SilentObserver, true)
        .await
}
