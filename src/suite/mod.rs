//! Suite loading.
//!
//! A suite file is YAML with three top-level keys:
//!
//! ```yaml
//! variables:
//!   base: https://httpbin.org
//! set_up:
//!   login:
//!     url: ${base}/anything
//! requests:
//!   first:
//!     url: ${base}/anything/${login.status}
//!     validation:
//!       status: 200
//! ```
//!
//! Requests keep the order in which they are written. Setup requests come
//! first and are flagged so repeat runs can skip them.

use crate::models::{Dictionary, Request, RequestDetails};
use crate::variables::VariableContext;
use indexmap::IndexMap;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Errors that prevent a suite from running at all.
#[derive(Debug)]
pub enum SuiteError {
    /// The suite file could not be read.
    Io { path: PathBuf, source: std::io::Error },

    /// The suite document is malformed.
    Parse(String),

    /// The suite defines no requests.
    NoRequests,

    /// A request name is used both as a setup and a regular request.
    DuplicateRequest(String),
}

impl fmt::Display for SuiteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SuiteError::Io { path, source } => {
                write!(f, "Failed to read {}: {}", path.display(), source)
            }
            SuiteError::Parse(msg) => write!(f, "Failed to parse suite: {}", msg),
            SuiteError::NoRequests => write!(f, "no requests defined"),
            SuiteError::DuplicateRequest(name) => {
                write!(f, "request '{}' is defined more than once", name)
            }
        }
    }
}

impl std::error::Error for SuiteError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SuiteError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<serde_yaml::Error> for SuiteError {
    fn from(err: serde_yaml::Error) -> Self {
        SuiteError::Parse(err.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct Restfile {
    #[serde(default)]
    variables: Dictionary,
    #[serde(default)]
    set_up: IndexMap<String, RequestDetails>,
    #[serde(default)]
    requests: IndexMap<String, RequestDetails>,
}

/// Declared variables plus the ordered requests of one suite file.
#[derive(Debug, Clone, PartialEq)]
pub struct Suite {
    pub variables: Dictionary,
    /// Setup requests first, then regular requests, each in file order.
    pub requests: Vec<Request>,
}

impl Suite {
    /// Parses a suite from YAML text.
    pub fn from_yaml(text: &str) -> Result<Suite, SuiteError> {
        let restfile: Restfile = serde_yaml::from_str(text)?;

        if restfile.requests.is_empty() {
            return Err(SuiteError::NoRequests);
        }
        if let Some(name) = restfile
            .set_up
            .keys()
            .find(|name| restfile.requests.contains_key(*name))
        {
            return Err(SuiteError::DuplicateRequest(name.clone()));
        }

        let setup = restfile.set_up.into_iter().map(|(name, details)| {
            let mut request = Request::from_details(name, details);
            request.setup = true;
            request
        });
        let regular = restfile
            .requests
            .into_iter()
            .map(|(name, details)| Request::from_details(name, details));

        let requests: Vec<Request> = setup.chain(regular).collect();
        log::debug!("Loaded suite with {} requests", requests.len());

        Ok(Suite {
            variables: restfile.variables,
            requests,
        })
    }

    /// Reads and parses a suite file.
    pub fn load(path: impl AsRef<Path>) -> Result<Suite, SuiteError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SuiteError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&text)
    }

    /// Names of the setup requests.
    pub fn setup_names(&self) -> Vec<String> {
        self.requests
            .iter()
            .filter(|request| request.setup)
            .map(|request| request.name.clone())
            .collect()
    }

    pub fn request(&self, name: &str) -> Option<&Request> {
        self.requests.iter().find(|request| request.name == name)
    }

    /// Builds the initial context for a run from the declared variables and
    /// the given environment.
    pub fn context(&self, environment: HashMap<String, String>) -> VariableContext {
        VariableContext::new(self.variables.clone(), environment)
    }
}
