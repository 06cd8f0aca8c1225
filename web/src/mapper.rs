//! Event mappers.
//!
//! A mapper turns the raw [`RequestEvent`] into the command's input before
//! validation. Mapping failures are unclassified: the caller sees a generic
//! 500 and the reason is logged.

use commander_core::{Headers, PipelineError, RequestEvent, Result};
use serde::de::DeserializeOwned;
use std::fmt;
use std::future::Future;
use std::marker::PhantomData;

/// Message for a body that is missing or not valid JSON.
pub const INVALID_SOURCE: &str = "Invalid Source";

/// Maps a raw event to a command input.
pub trait EventMapper: Send + Sync {
    /// The command input produced.
    type Output: Send;

    /// Map `event`.
    ///
    /// # Errors
    ///
    /// Returns an error if the event does not carry what the command needs.
    fn map(&self, event: &RequestEvent) -> impl Future<Output = Result<Self::Output>> + Send;
}

/// Hands the raw event to the command unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

impl EventMapper for Passthrough {
    type Output = RequestEvent;

    async fn map(&self, event: &RequestEvent) -> Result<RequestEvent> {
        Ok(event.clone())
    }
}

/// Extracts one path parameter.
///
/// A missing parameter maps to `None` unless the mapper is
/// [`required`](Self::required).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathParameterMapper {
    name: String,
    required: bool,
}

impl PathParameterMapper {
    /// Optional parameter `name`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: false,
        }
    }

    /// Fail when the parameter is missing.
    #[must_use]
    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

impl EventMapper for PathParameterMapper {
    type Output = Option<String>;

    async fn map(&self, event: &RequestEvent) -> Result<Option<String>> {
        match event.path_parameter(&self.name) {
            Some(value) => Ok(Some(value.to_string())),
            None if self.required => Err(PipelineError::Unclassified(anyhow::anyhow!(
                "No Value for {} present in the path",
                self.name
            ))),
            None => Ok(None),
        }
    }
}

/// Parses the JSON body into `T`.
pub struct BodyMapper<T> {
    _target: PhantomData<fn() -> T>,
}

impl<T> BodyMapper<T> {
    /// Create a body mapper.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _target: PhantomData,
        }
    }
}

impl<T> Default for BodyMapper<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for BodyMapper<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for BodyMapper<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BodyMapper")
    }
}

impl<T> EventMapper for BodyMapper<T>
where
    T: DeserializeOwned + Send,
{
    type Output = T;

    async fn map(&self, event: &RequestEvent) -> Result<T> {
        let body = event
            .body
            .as_deref()
            .filter(|body| !body.is_empty())
            .ok_or_else(|| PipelineError::Unclassified(anyhow::anyhow!(INVALID_SOURCE)))?;

        serde_json::from_str(body)
            .map_err(|err| PipelineError::Unclassified(anyhow::Error::new(err).context(INVALID_SOURCE)))
    }
}

/// Hands the request headers to the command.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeadersMapper;

impl EventMapper for HeadersMapper {
    type Output = Headers;

    async fn map(&self, event: &RequestEvent) -> Result<Headers> {
        Ok(event.headers.clone())
    }
}
