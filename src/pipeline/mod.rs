//! Ordered request execution.
//!
//! A [`Pipeline`] runs requests strictly in declaration order. Each request
//! is substituted against the current [`VariableContext`], sent, validated,
//! reported to an [`Observer`] and, when valid, captured so later requests
//! can reference it. A failing request never stops the run.

pub mod log_directive;
pub mod observer;
pub mod stats;

pub use log_directive::{log_records, LogRecord, LogSink, LogSinkError, LogTarget, StandardLogSink};
pub use observer::{ConsoleReporter, Observer, SilentObserver};
pub use stats::{Stats, StatsRecorder};

use crate::executor::{build_call, ExecutionConfig, HttpClient, RequestError};
use crate::models::{Request, Response, Value};
use crate::validation::{validate_response, ValidationResult};
use crate::variables::VariableContext;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Reported outcome of one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
    /// Reserved for observers that decide a request should not count.
    Skipped,
}

impl From<&ValidationResult> for Outcome {
    fn from(result: &ValidationResult) -> Self {
        if result.is_valid() {
            Outcome::Success
        } else {
            Outcome::Failure
        }
    }
}

/// Outcome of one request together with its validation result.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestOutcome {
    pub name: String,
    pub outcome: Outcome,
    pub result: ValidationResult,
}

/// Everything a run produced.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// One entry per executed request, in execution order.
    pub outcomes: Vec<RequestOutcome>,
    /// The context after the last request, including all captures.
    pub context: VariableContext,
}

impl RunReport {
    pub fn summary(&self) -> Summary {
        let mut summary = Summary::default();
        for entry in &self.outcomes {
            summary.total += 1;
            match entry.outcome {
                Outcome::Failure => summary.failed += 1,
                Outcome::Skipped => summary.skipped += 1,
                Outcome::Success => {}
            }
        }
        summary
    }

    /// Names and outcomes in execution order.
    pub fn results(&self) -> Vec<(&str, Outcome)> {
        self.outcomes
            .iter()
            .map(|entry| (entry.name.as_str(), entry.outcome))
            .collect()
    }
}

/// Aggregated counts over one or more runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub total: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl Summary {
    pub fn add(&mut self, other: &Summary) {
        self.total += other.total;
        self.failed += other.failed;
        self.skipped += other.skipped;
    }

    pub fn succeeded(&self) -> usize {
        self.total - self.failed - self.skipped
    }

    /// Process exit code: non-zero iff anything failed.
    pub fn exit_code(&self) -> i32 {
        if self.failed == 0 {
            0
        } else {
            1
        }
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tests = if self.total == 1 { "test" } else { "tests" };
        write!(f, "Executed {} {}", self.total, tests)?;
        if self.failed == 0 {
            write!(f, ", all passed")?;
        } else {
            write!(f, ", {} failed", self.failed)?;
        }
        if self.skipped > 0 {
            write!(f, ", {} skipped", self.skipped)?;
        }
        Ok(())
    }
}

/// Runs requests in order against an HTTP client.
pub struct Pipeline {
    client: Arc<dyn HttpClient>,
    config: ExecutionConfig,
    log_sink: Option<Arc<dyn LogSink>>,
}

impl Pipeline {
    pub fn new(client: Arc<dyn HttpClient>, config: ExecutionConfig) -> Self {
        Self {
            client,
            config,
            log_sink: None,
        }
    }

    /// Sets the sink that receives records produced by `log` directives.
    pub fn with_log_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.log_sink = Some(sink);
        self
    }

    pub fn config(&self) -> &ExecutionConfig {
        &self.config
    }

    /// Runs `requests` in order.
    ///
    /// Setup requests are skipped when `run_setup` is false. Each request
    /// completes, including capture, before the next one starts.
    pub async fn run(
        &self,
        requests: &[Request],
        mut context: VariableContext,
        observer: &mut dyn Observer,
        run_setup: bool,
    ) -> RunReport {
        let mut outcomes = Vec::with_capacity(requests.len());

        for request in requests {
            if request.setup && !run_setup {
                log::debug!("Skipping setup request '{}'", request.name);
                continue;
            }

            observer.before(&request.name);

            let (response, result) = match self.execute(request, &context).await {
                Ok(response) => {
                    let result = match &request.validation {
                        Some(validation) => validate_response(validation, &response),
                        None => ValidationResult::Valid,
                    };
                    (Some(response), result)
                }
                Err(err) => {
                    log::debug!("Request '{}' failed: {}", request.name, err);
                    (None, ValidationResult::failure(err.to_string()))
                }
            };

            if let (Some(response), Some(directive)) = (&response, &request.log) {
                self.write_logs(&request.name, directive, response);
            }

            let outcome = observer.after(&request.name, response.as_ref(), &result);

            if result.is_valid() {
                if let Some(response) = &response {
                    context.capture(&request.name, response);
                }
            }

            outcomes.push(RequestOutcome {
                name: request.name.clone(),
                outcome,
                result,
            });
        }

        RunReport { outcomes, context }
    }

    async fn execute(
        &self,
        request: &Request,
        context: &VariableContext,
    ) -> Result<Response, RequestError> {
        let scoped = context.scoped(&request.variables);
        let resolved = request.substitute(&scoped)?;
        let call = build_call(&resolved, &self.config)?;

        let seconds = resolved.delay_seconds();
        if seconds > 0.0 {
            let delay = Duration::try_from_secs_f64(seconds)
                .map_err(|_| RequestError::InvalidDelay(seconds))?;
            log::debug!("Delaying '{}' by {:?}", request.name, delay);
            tokio::time::sleep(delay).await;
        }

        self.client.execute(call).await
    }

    fn write_logs(&self, name: &str, directive: &Value, response: &Response) {
        let Some(sink) = &self.log_sink else {
            return;
        };
        for record in log_records(directive, response) {
            if let Err(e) = sink.write(&record) {
                log::warn!("Failed to write log '{}' for '{}': {}", record.label, name, e);
            }
        }
    }
}
