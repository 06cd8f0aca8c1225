//! Tracing setup and per-invocation correlation.

use commander_core::{AlertConfig, ConfigError, EnvSource, Headers, TracingLogger, WebhookAlertSink};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// Header carrying the caller's correlation ID.
pub const CORRELATION_ID_HEADER: &str = "X-Correlation-ID";

/// Install a `fmt` subscriber filtered by `RUST_LOG`.
///
/// Falls back to `default_directive` when `RUST_LOG` is unset or invalid.
/// Returns `false` if a global subscriber was already installed, which is
/// the normal case for warm invocations.
pub fn install_subscriber(default_directive: &str) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok()
}

/// Build the production logger.
///
/// Alerts are delivered to the webhook named by `CRITICAL_ALERT_URL` when it
/// is set; otherwise alerts are only logged.
///
/// # Errors
///
/// Returns [`ConfigError::Invalid`] if the alert URL does not parse, and
/// [`ConfigError::Missing`] if the URL is set without `CRITICAL_ALERT_SUBJECT`.
pub fn logger_from_env(source: &impl EnvSource) -> Result<Arc<TracingLogger>, ConfigError> {
    let logger = match AlertConfig::from_env(source)? {
        Some(config) => {
            tracing::info!(url = %config.url, "Critical alerts enabled");
            TracingLogger::with_alert_sink(Arc::new(WebhookAlertSink::new(config)))
        }
        None => TracingLogger::new(),
    };
    Ok(Arc::new(logger))
}

/// Correlation ID for one invocation.
///
/// Uses the caller's `X-Correlation-ID` when it is a valid UUID, otherwise
/// a fresh one.
#[must_use]
pub fn correlation_id(headers: &Headers) -> Uuid {
    headers
        .get_ignore_case(CORRELATION_ID_HEADER)
        .and_then(|value| value.as_text())
        .and_then(|text| Uuid::parse_str(text).ok())
        .unwrap_or_else(Uuid::new_v4)
}
