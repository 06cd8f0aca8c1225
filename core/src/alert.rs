//! Out-of-band operator alerts.
//!
//! Alerts are critical notifications that bypass the normal log stream. The
//! [`AlertSink`] trait abstracts over the delivery channel; the only shipped
//! channel is [`WebhookAlertSink`], which POSTs a JSON payload.

use crate::config::{ConfigError, EnvSource};
use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use serde::Serialize;
use thiserror::Error;

/// Environment variable holding the webhook URL.
pub const ALERT_URL_VAR: &str = "CRITICAL_ALERT_URL";

/// Environment variable holding the alert subject line.
pub const ALERT_SUBJECT_VAR: &str = "CRITICAL_ALERT_SUBJECT";

/// Alert delivery failure.
#[derive(Debug, Error)]
pub enum AlertError {
    /// No alert channel is configured.
    #[error("no alert channel configured")]
    NotConfigured,

    /// The channel rejected or failed to accept the alert.
    #[error("alert delivery failed: {0}")]
    Delivery(String),
}

/// A single operator alert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Alert {
    /// Subject line.
    pub subject: String,
    /// Alert body.
    pub message: String,
    /// When the alert was raised.
    pub timestamp: DateTime<Utc>,
}

impl Alert {
    /// Create an alert stamped with the current time.
    #[must_use]
    pub fn new(subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            message: message.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Delivery channel for alerts.
pub trait AlertSink: Send + Sync {
    /// Subject line stamped on alerts sent through this sink.
    fn subject(&self) -> &str;

    /// Deliver one alert.
    ///
    /// # Errors
    ///
    /// Returns [`AlertError::Delivery`] if the channel could not accept it.
    fn publish<'a>(&'a self, alert: &'a Alert) -> BoxFuture<'a, Result<(), AlertError>>;
}

/// Alert channel configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertConfig {
    /// Webhook endpoint.
    pub url: reqwest::Url,
    /// Subject line.
    pub subject: String,
}

impl AlertConfig {
    /// Read the alert channel from the environment.
    ///
    /// Returns `Ok(None)` when no URL is configured: alerts are then disabled.
    /// Once a URL is set the subject becomes required.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the URL does not parse, and
    /// [`ConfigError::Missing`] if the URL is set without a subject.
    pub fn from_env(source: &impl EnvSource) -> Result<Option<Self>, ConfigError> {
        let Some(raw) = source.var(ALERT_URL_VAR).filter(|raw| !raw.trim().is_empty()) else {
            return Ok(None);
        };
        let url = reqwest::Url::parse(raw.trim()).map_err(|err| ConfigError::Invalid {
            key: ALERT_URL_VAR.to_string(),
            reason: err.to_string(),
        })?;
        let subject = source
            .var(ALERT_SUBJECT_VAR)
            .filter(|subject| !subject.trim().is_empty())
            .ok_or_else(|| ConfigError::Missing(ALERT_SUBJECT_VAR.to_string()))?;
        Ok(Some(Self { url, subject }))
    }
}

/// Alert sink that POSTs alerts as JSON to a webhook.
#[derive(Debug, Clone)]
pub struct WebhookAlertSink {
    client: reqwest::Client,
    config: AlertConfig,
}

impl WebhookAlertSink {
    /// Create a sink for the configured webhook.
    #[must_use]
    pub fn new(config: AlertConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }
}

impl AlertSink for WebhookAlertSink {
    fn subject(&self) -> &str {
        &self.config.subject
    }

    fn publish<'a>(&'a self, alert: &'a Alert) -> BoxFuture<'a, Result<(), AlertError>> {
        Box::pin(async move {
            self.client
                .post(self.config.url.clone())
                .json(alert)
                .send()
                .await
                .and_then(reqwest::Response::error_for_status)
                .map_err(|err| AlertError::Delivery(err.to_string()))?;
            Ok(())
        })
    }
}
