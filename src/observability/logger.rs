//! Structured JSON logger
//!
//! One log line = one event. The line always starts with `event` and
//! `severity`, followed by the caller's fields in alphabetical order.
//! Logging is synchronous and never fails the caller.

use std::collections::BTreeMap;
use std::fmt;
use std::io::{self, Write};

/// Log severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Normal operations
    Info = 0,
    /// Rejected input, caller can recover
    Warn = 1,
}

impl Severity {
    /// Returns the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
        }
    }

    /// Warnings go to stderr, everything else to stdout.
    fn uses_stderr(&self) -> bool {
        *self >= Severity::Warn
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Stateless structured logger.
pub struct Logger;

impl Logger {
    fn log(severity: Severity, event: &str, fields: &[(&str, &str)]) {
        if severity.uses_stderr() {
            Self::log_to_writer(severity, event, fields, &mut io::stderr());
        } else {
            Self::log_to_writer(severity, event, fields, &mut io::stdout());
        }
    }

    fn log_to_writer<W: Write>(
        severity: Severity,
        event: &str,
        fields: &[(&str, &str)],
        writer: &mut W,
    ) {
        let line = Self::render(severity, event, fields);
        // A broken log sink must not take the index down with it.
        let _ = writer.write_all(line.as_bytes());
        let _ = writer.flush();
    }

    /// Render a single JSON line, newline-terminated.
    fn render(severity: Severity, event: &str, fields: &[(&str, &str)]) -> String {
        let sorted: BTreeMap<&str, &str> = fields.iter().copied().collect();

        let mut line = String::with_capacity(64 + fields.len() * 24);
        line.push_str("{\"event\":");
        line.push_str(&json_string(event));
        line.push_str(",\"severity\":");
        line.push_str(&json_string(severity.as_str()));
        for (key, value) in sorted {
            line.push(',');
            line.push_str(&json_string(key));
            line.push(':');
            line.push_str(&json_string(value));
        }
        line.push_str("}\n");
        line
    }

    /// Log at INFO level
    pub fn info(event: &str, fields: &[(&str, &str)]) {
        Self::log(Severity::Info, event, fields);
    }

    /// Log at WARN level
    pub fn warn(event: &str, fields: &[(&str, &str)]) {
        Self::log(Severity::Warn, event, fields);
    }
}

fn json_string(s: &str) -> String {
    // Serializing a &str cannot fail.
    serde_json::to_string(s).unwrap_or_else(|_| String::from("\"\""))
}

/// Capture a rendered log line for testing
#[cfg(test)]
pub fn capture_log(severity: Severity, event: &str, fields: &[(&str, &str)]) -> String {
    let mut buffer = Vec::new();
    Logger::log_to_writer(severity, event, fields, &mut buffer);
    String::from_utf8(buffer).unwrap()
}
