//! Pipeline observers.
//!
//! Observers are told when each request starts and finishes. They may print
//! or record statistics but cannot influence substitution or matching.

use super::stats::StatsRecorder;
use super::Outcome;
use crate::models::Response;
use crate::validation::ValidationResult;
use std::io::Write;

/// Receives per-request notifications from the pipeline.
pub trait Observer {
    fn before(&mut self, name: &str);

    /// Called once a request has been validated, or has failed before
    /// validation (then `response` is `None`). Returns the outcome to report.
    fn after(&mut self, name: &str, response: Option<&Response>, result: &ValidationResult)
        -> Outcome;
}

/// Observer that reports nothing and classifies results as-is.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentObserver;

impl Observer for SilentObserver {
    fn before(&mut self, _name: &str) {}

    fn after(
        &mut self,
        _name: &str,
        _response: Option<&Response>,
        result: &ValidationResult,
    ) -> Outcome {
        Outcome::from(result)
    }
}

/// Prints progress lines for each request.
pub struct ConsoleReporter<W: Write> {
    out: W,
    verbose: bool,
    stats: Option<StatsRecorder>,
}

impl ConsoleReporter<std::io::Stdout> {
    pub fn stdout(verbose: bool) -> Self {
        Self::new(std::io::stdout(), verbose)
    }
}

impl<W: Write> ConsoleReporter<W> {
    pub fn new(out: W, verbose: bool) -> Self {
        Self {
            out,
            verbose,
            stats: None,
        }
    }

    /// Enables per-request latency statistics.
    pub fn with_stats(mut self) -> Self {
        self.stats = Some(StatsRecorder::new());
        self
    }

    pub fn stats(&self) -> Option<&StatsRecorder> {
        self.stats.as_ref()
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    // Console output is best effort: a closed stdout must not fail a request.
    fn line(&mut self, text: std::fmt::Arguments<'_>) {
        if let Err(e) = writeln!(self.out, "{}", text) {
            log::warn!("Failed to write report line: {}", e);
        }
    }

    fn dump_response(&mut self, response: &Response) {
        let body = response
            .body_as_string()
            .unwrap_or_else(|_| format!("<{} bytes of binary data>", response.body.len()));
        self.line(format_args!("Response:"));
        self.line(format_args!("  status: {}", response.status));
        let headers: Vec<String> = response
            .headers
            .iter()
            .map(|(name, value)| format!("  {}: {}", name, value))
            .collect();
        for header in headers {
            self.line(format_args!("{}", header));
        }
        self.line(format_args!("  {}\n", body));
    }
}

impl<W: Write> Observer for ConsoleReporter<W> {
    fn before(&mut self, name: &str) {
        self.line(format_args!("🎬  {} started ...\n", name));
    }

    fn after(&mut self, name: &str, response: Option<&Response>, result: &ValidationResult) -> Outcome {
        match result {
            ValidationResult::Valid => {
                match response {
                    Some(response) => {
                        let seconds = response.elapsed.as_secs_f64();
                        self.line(format_args!("✅  {} PASSED ({:.3}s)\n", name, seconds));
                        if let Some(stats) = self.stats.as_mut() {
                            stats.record(name, response.elapsed);
                            let report = stats.to_string();
                            self.line(format_args!("{}", report));
                        }
                    }
                    None => self.line(format_args!("✅  {} PASSED\n", name)),
                }
                Outcome::Success
            }
            ValidationResult::Invalid { message, .. } => {
                if self.verbose {
                    if let Some(response) = response {
                        self.dump_response(response);
                    }
                }
                self.line(format_args!("❌  {} FAILED : {}\n", name, message));
                Outcome::Failure
            }
        }
    }
}
