//! Lifecycle diagnostics
//!
//! When verbose logging is enabled the link reports one-line events
//! (`{timestamp, routine, message}`) to a [`DiagnosticsSink`]. The default
//! sink discards them.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::Mutex;

/// A single lifecycle event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub at: DateTime<Utc>,
    /// Emitting routine, e.g. `link.connect`
    pub routine: &'static str,
    pub message: String,
}

impl Diagnostic {
    pub fn new(routine: &'static str, message: impl Into<String>) -> Self {
        Self {
            at: Utc::now(),
            routine,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - doclink {} - {}",
            self.at.to_rfc3339_opts(SecondsFormat::Millis, true),
            self.routine,
            self.message
        )
    }
}

/// Receiver of lifecycle events
pub trait DiagnosticsSink: Send + Sync {
    fn record(&self, diagnostic: &Diagnostic);
}

/// Discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl DiagnosticsSink for NoopSink {
    fn record(&self, _diagnostic: &Diagnostic) {}
}

/// Forwards events to `tracing` at info level
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticsSink for TracingSink {
    fn record(&self, diagnostic: &Diagnostic) {
        tracing::info!(
            target: "doclink::diagnostics",
            at = %diagnostic.at.to_rfc3339_opts(SecondsFormat::Millis, true),
            routine = diagnostic.routine,
            "{}",
            diagnostic.message
        );
    }
}

/// Keeps events in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: Mutex<Vec<Diagnostic>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded events, oldest first
    pub fn entries(&self) -> Vec<Diagnostic> {
        self.entries.lock().clone()
    }

    /// Routines of the recorded events, oldest first
    pub fn routines(&self) -> Vec<&'static str> {
        self.entries.lock().iter().map(|d| d.routine).collect()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl DiagnosticsSink for MemorySink {
    fn record(&self, diagnostic: &Diagnostic) {
        self.entries.lock().push(diagnostic.clone());
    }
}

/// Sink gated on the verbose logging switch
#[derive(Clone)]
pub(crate) struct Diagnostics {
    sink: Arc<dyn DiagnosticsSink>,
    enabled: bool,
}

impl Diagnostics {
    pub(crate) fn new(sink: Arc<dyn DiagnosticsSink>, enabled: bool) -> Self {
        Self { sink, enabled }
    }

    pub(crate) fn with_sink(self, sink: Arc<dyn DiagnosticsSink>) -> Self {
        Self {
            sink,
            enabled: self.enabled,
        }
    }

    pub(crate) fn emit(&self, routine: &'static str, message: impl fmt::Display) {
        if self.enabled {
            self.sink.record(&Diagnostic::new(routine, message.to_string()));
        }
    }
}

impl fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Diagnostics")
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_display_is_one_line() {
        let diagnostic = Diagnostic {
            at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 5).unwrap(),
            routine: "link.connect",
            message: "connected to mongodb://db1:27017".to_string(),
        };
        assert_eq!(
            diagnostic.to_string(),
            "2024-03-01T12:30:05.000Z - doclink link.connect - connected to mongodb://db1:27017"
        );
    }

    #[test]
    fn test_disabled_diagnostics_record_nothing() {
        let sink = Arc::new(MemorySink::new());
        let diagnostics = Diagnostics::new(sink.clone(), false);

        diagnostics.emit("link.connect", "attempt 1");
        assert!(sink.entries().is_empty());
    }

    #[test]
    fn test_enabled_diagnostics_reach_sink() {
        let sink = Arc::new(MemorySink::new());
        let diagnostics = Diagnostics::new(Arc::new(NoopSink), false).with_sink(sink.clone());
        diagnostics.emit("link.connect", "ignored");
        assert!(sink.entries().is_empty());

        let diagnostics = Diagnostics::new(sink.clone(), true);
        diagnostics.emit("link.connect", "attempt 1");
        diagnostics.emit("link.disconnect", format_args!("closed {}", "db1"));

        assert_eq!(sink.routines(), vec!["link.connect", "link.disconnect"]);
        assert_eq!(sink.entries()[1].message, "closed db1");

        sink.clear();
        assert!(sink.routines().is_empty());
    }

    #[test]
    fn test_tracing_sink_does_not_panic_without_subscriber() {
        TracingSink.record(&Diagnostic::new("link.ping", "ok"));
        NoopSink.record(&Diagnostic::new("link.ping", "ok"));
    }
}
