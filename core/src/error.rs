//! Failure taxonomy and its wire representation.
//!
//! Failures come in two tiers:
//!
//! - **Classified** ([`CommandError`]): a closed set of kinds that know their
//!   own status code and log severity, and whose message is safe to show to
//!   the caller.
//! - **Unclassified** (any other error, carried as [`anyhow::Error`]): assumed
//!   unsafe to expose. Always logged at ERROR and flattened to a fixed
//!   `500 Internal Server Error` body.
//!
//! [`PipelineError`] unifies both tiers so command bodies can use `?` on
//! either.

use crate::http::{Headers, Response};
use crate::logging::{Logger, Severity};
use crate::repository::RepositoryError;
use http::{Method, StatusCode};
use serde_json::json;
use thiserror::Error;

/// Result type alias for pipeline operations.
pub type Result<T, E = PipelineError> = std::result::Result<T, E>;

/// Message used whenever a credential cannot be accepted.
pub const INVALID_TOKEN: &str = "Invalid Token";

/// Message returned for every unclassified failure.
pub const INTERNAL_SERVER_ERROR: &str = "Internal Server Error";

/// Classified failure.
///
/// Every kind renders itself into a complete [`Response`]; construction and
/// rendering cannot fail.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// The caller could not be authenticated or is not allowed to act.
    #[error("{0}")]
    Authorisation(String),

    /// The requested resource does not exist.
    #[error("{0}")]
    NotFound(String),

    /// The request cannot be processed.
    #[error("{0}")]
    Standard(String),

    /// The request input failed validation.
    #[error("{0}")]
    InputValidation(String),

    /// A call to an upstream service failed.
    #[error("{method} request failed with status {status}: {message}")]
    UpstreamRequest {
        /// Method of the upstream call.
        method: Method,
        /// Status the upstream call returned; passed through to the caller.
        status: StatusCode,
        /// Caller-safe description.
        message: String,
    },
}

impl CommandError {
    /// Create an [`Authorisation`](Self::Authorisation) error.
    #[must_use]
    pub fn authorisation(message: impl Into<String>) -> Self {
        Self::Authorisation(message.into())
    }

    /// Create a [`NotFound`](Self::NotFound) error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Create a [`Standard`](Self::Standard) error.
    #[must_use]
    pub fn standard(message: impl Into<String>) -> Self {
        Self::Standard(message.into())
    }

    /// Create an [`InputValidation`](Self::InputValidation) error.
    #[must_use]
    pub fn input_validation(message: impl Into<String>) -> Self {
        Self::InputValidation(message.into())
    }

    /// Create an [`UpstreamRequest`](Self::UpstreamRequest) error.
    #[must_use]
    pub fn upstream(method: Method, status: StatusCode, message: impl Into<String>) -> Self {
        Self::UpstreamRequest {
            method,
            status,
            message: message.into(),
        }
    }

    /// Severity this kind is logged at.
    #[must_use]
    pub const fn severity(&self) -> Severity {
        match self {
            Self::Authorisation(_) => Severity::Security,
            Self::NotFound(_) => Severity::Info,
            Self::Standard(_) | Self::UpstreamRequest { .. } => Severity::Error,
            Self::InputValidation(_) => Severity::Warning,
        }
    }

    /// Status code this kind maps to.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Authorisation(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Standard(_) | Self::InputValidation(_) => StatusCode::BAD_REQUEST,
            Self::UpstreamRequest { status, .. } => *status,
        }
    }

    /// Caller-safe message.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Authorisation(message)
            | Self::NotFound(message)
            | Self::Standard(message)
            | Self::InputValidation(message)
            | Self::UpstreamRequest { message, .. } => message,
        }
    }

    /// Render the complete response for this failure.
    #[must_use]
    pub fn render(&self, headers: &Headers) -> Response {
        let body = json!({ "message": self.message() }).to_string();
        Response::new(self.status(), headers.clone(), body)
    }
}

/// Any failure raised while processing one invocation.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A failure from the taxonomy.
    #[error(transparent)]
    Classified(#[from] CommandError),

    /// Anything else. Never shown to the caller.
    #[error(transparent)]
    Unclassified(#[from] anyhow::Error),
}

impl PipelineError {
    /// Wrap an arbitrary error as unclassified.
    pub fn unclassified<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Unclassified(anyhow::Error::new(err))
    }

    /// The classified failure, if this is one.
    #[must_use]
    pub const fn as_classified(&self) -> Option<&CommandError> {
        match self {
            Self::Classified(err) => Some(err),
            Self::Unclassified(_) => None,
        }
    }

    /// Log this failure and turn it into the response sent to the caller.
    ///
    /// Classified failures are logged at their own severity and render
    /// themselves. Unclassified failures are logged at ERROR and replaced by
    /// a fixed 500 body; their message never reaches the caller.
    #[must_use]
    pub fn into_response(self, headers: &Headers, logger: &dyn Logger) -> Response {
        match self {
            Self::Classified(err) => {
                logger.log(err.severity(), &err);
                err.render(headers)
            }
            Self::Unclassified(err) => {
                logger.error(&format_args!("{err:#}"));
                internal_server_error(headers)
            }
        }
    }
}

impl From<RepositoryError> for PipelineError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(message) => CommandError::NotFound(message).into(),
            other @ (RepositoryError::Duplicate { .. } | RepositoryError::Transport(_)) => {
                Self::unclassified(other)
            }
        }
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(err: serde_json::Error) -> Self {
        Self::unclassified(err)
    }
}

/// The fixed response for unclassified failures.
#[must_use]
pub fn internal_server_error(headers: &Headers) -> Response {
    let body = json!({ "messages": [INTERNAL_SERVER_ERROR] }).to_string();
    Response::new(StatusCode::INTERNAL_SERVER_ERROR, headers.clone(), body)
}
