//! Request `log` directives.
//!
//! The pipeline only computes what to log. Writing is delegated to a
//! [`LogSink`].

use crate::models::{Response, Value};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

static FILE_DIRECTIVE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\.file\((.+)\)$").expect("Failed to compile file directive regex"));

/// Where a log record goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Console,
    /// A file name, relative to the sink's working directory unless absolute.
    File(PathBuf),
}

/// One value to be logged.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    pub target: LogTarget,
    pub label: String,
    pub value: Value,
}

impl LogRecord {
    fn console(label: impl Into<String>, value: Value) -> Self {
        Self {
            target: LogTarget::Console,
            label: label.into(),
            value,
        }
    }
}

/// Evaluates a log directive against a response.
///
/// Unknown directives and `json` parts of a response without a JSON body
/// produce nothing.
pub fn log_records(directive: &Value, response: &Response) -> Vec<LogRecord> {
    let mut records = Vec::new();
    collect(directive, response, &mut records);
    records
}

fn collect(directive: &Value, response: &Response, records: &mut Vec<LogRecord>) {
    match directive {
        Value::Bool(true) => {
            for part in ["status", "headers", "json"] {
                collect(&Value::from(part), response, records);
            }
        }
        Value::String(s) if s == "status" => {
            records.push(LogRecord::console("Status", Value::Int(response.status as i64)));
        }
        Value::String(s) if s == "headers" => {
            records.push(LogRecord::console("Headers", response.headers_value()));
        }
        Value::String(s) if s == "json" => {
            if let Some(json) = &response.json {
                records.push(LogRecord::console("JSON", json.clone()));
            }
        }
        Value::String(s) if s.starts_with("json.") => {
            let path = &s["json.".len()..];
            if let Some(value) = response.json.as_ref().and_then(|json| json.get(path)) {
                records.push(LogRecord::console(path, value.clone()));
            }
        }
        Value::String(s) => {
            if let Some(caps) = FILE_DIRECTIVE.captures(s) {
                let file = caps[1].trim().to_string();
                records.push(LogRecord {
                    target: LogTarget::File(PathBuf::from(&file)),
                    label: file,
                    value: response.to_value(),
                });
            } else {
                log::debug!("Ignoring unknown log directive '{}'", s);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect(item, response, records);
            }
        }
        _ => {}
    }
}

/// Errors raised while writing a log record.
#[derive(Debug)]
pub enum LogSinkError {
    Io(std::io::Error),
    Serialization(String),
}

impl fmt::Display for LogSinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogSinkError::Io(err) => write!(f, "Failed to write log: {}", err),
            LogSinkError::Serialization(msg) => write!(f, "Failed to serialize log value: {}", msg),
        }
    }
}

impl std::error::Error for LogSinkError {}

impl From<std::io::Error> for LogSinkError {
    fn from(err: std::io::Error) -> Self {
        LogSinkError::Io(err)
    }
}

impl From<serde_json::Error> for LogSinkError {
    fn from(err: serde_json::Error) -> Self {
        LogSinkError::Serialization(err.to_string())
    }
}

/// Writes log records.
pub trait LogSink: Send + Sync {
    fn write(&self, record: &LogRecord) -> Result<(), LogSinkError>;
}

/// Writes console records to a writer and file records under a working
/// directory as pretty-printed JSON.
pub struct StandardLogSink {
    work_dir: PathBuf,
    console: Mutex<Box<dyn Write + Send>>,
}

impl StandardLogSink {
    /// Sink writing console records to stdout.
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self::with_writer(work_dir, Box::new(std::io::stdout()))
    }

    pub fn with_writer(work_dir: impl Into<PathBuf>, writer: Box<dyn Write + Send>) -> Self {
        Self {
            work_dir: work_dir.into(),
            console: Mutex::new(writer),
        }
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }
}

impl LogSink for StandardLogSink {
    fn write(&self, record: &LogRecord) -> Result<(), LogSinkError> {
        match &record.target {
            LogTarget::Console => {
                let mut console = self
                    .console
                    .lock()
                    .map_err(|_| LogSinkError::Io(std::io::Error::other("console writer poisoned")))?;
                match &record.value {
                    Value::Array(_) | Value::Dictionary(_) => {
                        let pretty = serde_json::to_string_pretty(&record.value)?;
                        writeln!(console, "{}:\n{}\n", record.label, pretty)?;
                    }
                    scalar => writeln!(console, "{}: {}\n", record.label, scalar)?,
                }
                console.flush()?;
            }
            LogTarget::File(file) => {
                let path = self.work_dir.join(file);
                let pretty = serde_json::to_string_pretty(&record.value)?;
                std::fs::write(&path, pretty)?;
                log::debug!("Wrote log for '{}' to {}", record.label, path.display());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    fn response() -> Response {
        let mut headers = IndexMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        let body = br#"{"method": "GET", "headers": {"Host": "localhost"}}"#.to_vec();
        Response::new(200, headers, body, Duration::ZERO)
    }

    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_log_true_yields_all_parts() {
        let records = log_records(&Value::Bool(true), &response());
        let labels: Vec<&str> = records.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["Status", "Headers", "JSON"]);
        assert_eq!(records[0].value, Value::Int(200));
    }

    #[test]
    fn test_log_json_path() {
        let directive = Value::from(json!(["json.headers.Host", "json.missing"]));
        let records = log_records(&directive, &response());
        assert_eq!(
            records,
            vec![LogRecord::console("headers.Host", Value::from("localhost"))]
        );
    }

    #[test]
    fn test_log_false_and_unknown_are_ignored() {
        assert!(log_records(&Value::Bool(false), &response()).is_empty());
        assert!(log_records(&Value::from("body"), &response()).is_empty());
    }

    #[test]
    fn test_file_directive() {
        let records = log_records(&Value::from(".file(out.json)"), &response());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].target, LogTarget::File(PathBuf::from("out.json")));
        assert_eq!(records[0].value.get("json.method"), Some(&Value::from("GET")));
    }

    #[test]
    fn test_sink_writes_file_under_work_dir() {
        let dir = tempfile::tempdir().unwrap();
        let sink = StandardLogSink::new(dir.path());
        for record in log_records(&Value::from(".file(log.txt)"), &response()) {
            sink.write(&record).unwrap();
        }
        let content = std::fs::read_to_string(dir.path().join("log.txt")).unwrap();
        assert!(content.contains("\"method\": \"GET\""));
        assert!(content.contains("\"status\": 200"));
    }

    #[test]
    fn test_sink_writes_console_records() {
        let buffer = SharedBuffer::default();
        let sink = StandardLogSink::with_writer(".", Box::new(buffer.clone()));
        for record in log_records(&Value::from(json!(["status", "json"])), &response()) {
            sink.write(&record).unwrap();
        }
        let output = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
        assert!(output.starts_with("Status: 200\n"));
        assert!(output.contains("JSON:\n{"));
    }

    #[test]
    fn test_sink_reports_missing_directory() {
        let sink = StandardLogSink::new("/definitely/not/here");
        let record = LogRecord {
            target: LogTarget::File(PathBuf::from("log.txt")),
            label: "log.txt".to_string(),
            value: Value::Null,
        };
        assert!(matches!(sink.write(&record), Err(LogSinkError::Io(_))));
    }
}
