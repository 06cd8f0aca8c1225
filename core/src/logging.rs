//! Severity-tagged logging.
//!
//! Every component that logs receives an `Arc<dyn Logger>` from its owner:
//! the handler hands its logger to validators when they are registered and
//! to the command before each invocation. Nothing creates a logger behind
//! the caller's back.
//!
//! [`TracingLogger`] is the production implementation and forwards to
//! `tracing`. Critical operator notifications go through [`Logger::alert`],
//! which is delivered out of band by an [`AlertSink`].

use crate::alert::{Alert, AlertError, AlertSink};
use futures::future::BoxFuture;
use std::fmt;
use std::sync::Arc;

/// Classification tag attached to every log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    /// Security relevant event (failed authentication, denied role).
    Security,
    /// Failure that needs attention.
    Error,
    /// Suspicious but expected condition (rejected input).
    Warning,
    /// Informational event.
    Info,
    /// Diagnostic detail.
    Debug,
}

impl Severity {
    /// The tag as written in log output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Security => "SECURITY",
            Self::Error => "ERROR",
            Self::Warning => "WARNING",
            Self::Info => "INFO",
            Self::Debug => "DEBUG",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Logger collaborator.
///
/// Implementations must never fail back into the caller: `log` has no
/// error channel. Only [`alert`](Logger::alert) reports delivery problems,
/// since it talks to an external system.
pub trait Logger: Send + Sync {
    /// Record `detail` at the given severity.
    fn log(&self, severity: Severity, detail: &dyn fmt::Display);

    /// Send a critical notification to operators.
    ///
    /// # Errors
    ///
    /// Returns [`AlertError`] if no alert channel is configured or delivery failed.
    fn alert<'a>(&'a self, message: &'a str) -> BoxFuture<'a, Result<(), AlertError>>;

    /// Log at [`Severity::Error`].
    fn error(&self, detail: &dyn fmt::Display) {
        self.log(Severity::Error, detail);
    }

    /// Log at [`Severity::Warning`].
    fn warning(&self, detail: &dyn fmt::Display) {
        self.log(Severity::Warning, detail);
    }

    /// Log at [`Severity::Info`].
    fn information(&self, detail: &dyn fmt::Display) {
        self.log(Severity::Info, detail);
    }

    /// Log at [`Severity::Debug`].
    fn debug(&self, detail: &dyn fmt::Display) {
        self.log(Severity::Debug, detail);
    }

    /// Log at [`Severity::Security`].
    fn security(&self, detail: &dyn fmt::Display) {
        self.log(Severity::Security, detail);
    }
}

/// Logger backed by `tracing`.
///
/// SECURITY lines go to the `commander::security` target so they can be
/// routed separately by the subscriber.
#[derive(Clone, Default)]
pub struct TracingLogger {
    sink: Option<Arc<dyn AlertSink>>,
}

impl TracingLogger {
    /// Logger without an alert channel.
    #[must_use]
    pub const fn new() -> Self {
        Self { sink: None }
    }

    /// Logger that delivers alerts through `sink`.
    #[must_use]
    pub fn with_alert_sink(sink: Arc<dyn AlertSink>) -> Self {
        Self { sink: Some(sink) }
    }
}

impl fmt::Debug for TracingLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TracingLogger")
            .field("alerts", &self.sink.is_some())
            .finish()
    }
}

impl Logger for TracingLogger {
    fn log(&self, severity: Severity, detail: &dyn fmt::Display) {
        let tag = severity.as_str();
        match severity {
            Severity::Security => {
                tracing::warn!(target: "commander::security", severity = tag, "{detail}");
            }
            Severity::Error => tracing::error!(severity = tag, "{detail}"),
            Severity::Warning => tracing::warn!(severity = tag, "{detail}"),
            Severity::Info => tracing::info!(severity = tag, "{detail}"),
            Severity::Debug => tracing::debug!(severity = tag, "{detail}"),
        }
    }

    fn alert<'a>(&'a self, message: &'a str) -> BoxFuture<'a, Result<(), AlertError>> {
        Box::pin(async move {
            let Some(sink) = &self.sink else {
                self.error(&format_args!("Alert not delivered (no alert channel): {message}"));
                return Err(AlertError::NotConfigured);
            };
            let alert = Alert::new(sink.subject(), message);
            sink.publish(&alert).await.inspect_err(|err| {
                self.error(&format_args!("Alert delivery failed: {err}"));
            })
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct CapturingSink {
        published: Mutex<Vec<Alert>>,
    }

    impl AlertSink for CapturingSink {
        fn subject(&self) -> &str {
            "critical"
        }

        fn publish<'a>(&'a self, alert: &'a Alert) -> BoxFuture<'a, Result<(), AlertError>> {
            Box::pin(async move {
                self.published.lock().unwrap().push(alert.clone());
                Ok(())
            })
        }
    }

    #[test]
    fn test_severity_tags() {
        assert_eq!(Severity::Security.to_string(), "SECURITY");
        assert_eq!(Severity::Info.to_string(), "INFO");
        assert_eq!(Severity::Error.as_str(), "ERROR");
        assert_eq!(Severity::Warning.as_str(), "WARNING");
        assert_eq!(Severity::Debug.as_str(), "DEBUG");
    }

    #[test]
    fn test_alert_without_sink_is_not_configured() {
        let logger = TracingLogger::new();
        let result = tokio_test::block_on(logger.alert("disk on fire"));
        assert!(matches!(result, Err(AlertError::NotConfigured)));
    }

    #[test]
    fn test_alert_goes_to_sink() {
        let sink = Arc::new(CapturingSink::default());
        let logger = TracingLogger::with_alert_sink(sink.clone());

        tokio_test::block_on(logger.alert("disk on fire")).unwrap();

        let published = sink.published.lock().unwrap();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].message, "disk on fire");
        assert_eq!(published[0].subject, "critical");
    }

    #[test]
    fn test_log_never_panics_without_subscriber() {
        let logger = TracingLogger::new();
        logger.security(&"Invalid Token Basic abc");
        logger.information(&format_args!("{} request", "OPTIONS"));
    }
}
