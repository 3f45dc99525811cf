//! Observability for attribute indexes and cursors
//!
//! - Structured JSON logging for lifecycle events and rejected input
//! - Atomic counters for hot-path operations
//!
//! Observability is read-only: nothing here changes index or cursor state.

mod events;
mod logger;
mod metrics;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{IndexMetrics, MetricsSnapshot};

/// Rejections log at WARN, everything else at INFO.
fn event_severity(event: Event) -> Severity {
    if event.is_rejection() {
        Severity::Warn
    } else {
        Severity::Info
    }
}

/// Log an event with fields.
pub fn log_event(event: Event, fields: &[(&str, &str)]) {
    match event_severity(event) {
        Severity::Warn => Logger::warn(event.as_str(), fields),
        Severity::Info => Logger::info(event.as_str(), fields),
    }
}
