//! Logger that records instead of emitting.

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity

use commander_core::{AlertError, Logger, Severity};
use futures::future::BoxFuture;
use std::fmt;
use std::sync::{Arc, Mutex};

/// One recorded log call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// Severity the entry was logged at.
    pub severity: Severity,
    /// Rendered detail.
    pub message: String,
}

/// Logger that keeps every entry and alert in memory.
///
/// # Example
///
/// ```
/// use commander_core::{Logger, Severity};
/// use commander_testing::RecordingLogger;
///
/// let logger = RecordingLogger::new();
/// logger.security(&"Invalid Token Basic abc");
/// assert!(logger.contains(Severity::Security, "Basic abc"));
/// ```
#[derive(Clone, Debug, Default)]
pub struct RecordingLogger {
    entries: Arc<Mutex<Vec<LogEntry>>>,
    alerts: Arc<Mutex<Vec<String>>>,
}

impl RecordingLogger {
    /// Create an empty logger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every entry, in logging order.
    #[must_use]
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().unwrap().clone()
    }

    /// Messages logged at `severity`, in logging order.
    #[must_use]
    pub fn messages_at(&self, severity: Severity) -> Vec<String> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .filter(|entry| entry.severity == severity)
            .map(|entry| entry.message.clone())
            .collect()
    }

    /// Whether some entry at `severity` contains `needle`.
    #[must_use]
    pub fn contains(&self, severity: Severity, needle: &str) -> bool {
        self.messages_at(severity)
            .iter()
            .any(|message| message.contains(needle))
    }

    /// Alerts raised so far.
    #[must_use]
    pub fn alerts(&self) -> Vec<String> {
        self.alerts.lock().unwrap().clone()
    }

    /// Forget everything recorded (for test isolation).
    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
        self.alerts.lock().unwrap().clear();
    }
}

impl Logger for RecordingLogger {
    fn log(&self, severity: Severity, detail: &dyn fmt::Display) {
        self.entries.lock().unwrap().push(LogEntry {
            severity,
            message: detail.to_string(),
        });
    }

    fn alert<'a>(&'a self, message: &'a str) -> BoxFuture<'a, Result<(), AlertError>> {
        self.alerts.lock().unwrap().push(message.to_string());
        Box::pin(async { Ok(()) })
    }
}
