//! Rester: declarative API test suites.
//!
//! A suite is an ordered set of named HTTP requests. Each request has a
//! templated URL, headers, query and body plus an expected-response
//! pattern. Requests run one after another, and later requests can
//! reference values captured from earlier responses.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - **models**: The `Value` data model, request templates and responses
//! - **variables**: The variable context and `${...}` placeholder substitution
//! - **validation**: Structural matching of responses against patterns
//! - **executor**: Turning requests into HTTP calls and sending them
//! - **pipeline**: Ordered execution, observers, statistics and log directives
//! - **suite**: Loading suites from YAML files
//! - **config**: Runner configuration
//!
//! # Request Flow
//!
//! For every request the pipeline:
//! 1. Substitutes placeholders against the current variable context
//! 2. Waits for the request's delay, if any
//! 3. Sends the request through an [`executor::HttpClient`]
//! 4. Validates status, headers and JSON in that order
//! 5. Reports the result to an [`pipeline::Observer`]
//! 6. Captures the response under the request's name when it is valid
//!
//! # Usage
//!
//! ```no_run
//! use rester::executor::{ExecutionConfig, NativeClient};
//! use rester::pipeline::{ConsoleReporter, Pipeline};
//! use rester::suite::Suite;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let suite = Suite::load("tests.yml")?;
//! let pipeline = Pipeline::new(Arc::new(NativeClient::new()), ExecutionConfig::new(5));
//! let mut reporter = ConsoleReporter::stdout(false);
//! let context = suite.context(std::env::vars().collect());
//!
//! let report = pipeline.run(&suite.requests, context, &mut reporter, true).await;
//! println!("{}", report.summary());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod executor;
pub mod models;
pub mod pipeline;
pub mod suite;
pub mod validation;
pub mod variables;

pub use models::{Request, Response, Value};
pub use pipeline::{Outcome, Pipeline, RunReport, Summary};
pub use suite::{Suite, SuiteError};
pub use validation::ValidationResult;
pub use variables::{VarError, VariableContext};
