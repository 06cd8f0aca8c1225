//! Environment-sourced configuration primitives.
//!
//! Configuration is read once by whoever assembles the pipeline and then
//! passed in as plain values. Lookups go through [`EnvSource`] so tests can
//! supply a map instead of mutating the process environment.

use std::collections::HashMap;
use thiserror::Error;

/// Configuration error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A required variable is not set.
    #[error("Environment variable not set: {0}")]
    Missing(String),

    /// A variable is set but its value is unusable.
    #[error("Invalid value for {key}: {reason}")]
    Invalid {
        /// Variable name.
        key: String,
        /// What is wrong with it.
        reason: String,
    },
}

/// Source of configuration variables.
pub trait EnvSource {
    /// Value of `key`, if set.
    fn var(&self, key: &str) -> Option<String>;
}

/// The process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

/// Read `key`, falling back to `default`, then to the empty string.
///
/// A missing variable without a default is logged as a configuration failure
/// but never treated as fatal.
pub fn from_environment(source: &impl EnvSource, key: &str, default: Option<&str>) -> String {
    if let Some(value) = source.var(key) {
        return value;
    }
    if let Some(default) = default.filter(|default| !default.is_empty()) {
        return default.to_string();
    }
    tracing::warn!(
        variable = key,
        "Unable to find environment variable {key} [Environment Configuration Failure]"
    );
    String::new()
}

/// Split a comma-separated list, trimming entries and dropping empty ones.
#[must_use]
pub fn comma_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(ToString::to_string)
        .collect()
}
