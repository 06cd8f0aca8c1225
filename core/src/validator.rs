//! Input and output validation.
//!
//! A [`Validator`] asserts a precondition (input phase) or postcondition
//! (output phase) without mutating the value. The handler keeps one
//! [`ValidatorChain`] per phase.

use crate::error::CommandError;
use crate::logging::Logger;
use futures::future::{BoxFuture, try_join_all};
use regex::Regex;
use std::fmt;
use std::sync::Arc;

/// Message returned to the caller when a [`RegexValidator`] rejects.
pub const INVALID_REQUEST: &str = "Invalid Request";

/// Validation capability.
///
/// Rejections must be reported as a [`CommandError`]; a validator may not
/// swallow a failure.
pub trait Validator<T: ?Sized>: Send + Sync {
    /// Validate `value`.
    ///
    /// # Errors
    ///
    /// Returns the taxonomy error describing the rejection.
    fn validate<'a>(&'a self, value: &'a T) -> BoxFuture<'a, Result<(), CommandError>>;

    /// Receive the owner's logger before first use.
    ///
    /// Validators that never log can ignore it.
    fn attach_logger(&mut self, _logger: Arc<dyn Logger>) {}
}

/// Ordered set of validators for one phase.
///
/// Every validator is invoked exactly once per run and all of them are
/// polled concurrently. The run fails with the first rejection to resolve;
/// validators still pending at that point are cancelled. Their futures are
/// dropped and never complete, so side effects past their last `.await`
/// do not happen.
pub struct ValidatorChain<T: ?Sized> {
    validators: Vec<Box<dyn Validator<T>>>,
}

impl<T: ?Sized> ValidatorChain<T> {
    /// Empty chain.
    #[must_use]
    pub fn new() -> Self {
        Self {
            validators: Vec::new(),
        }
    }

    /// Append a validator.
    pub fn push(&mut self, validator: Box<dyn Validator<T>>) {
        self.validators.push(validator);
    }

    /// Number of registered validators.
    #[must_use]
    pub fn len(&self) -> usize {
        self.validators.len()
    }

    /// Whether no validators are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }
}

impl<T: ?Sized + Sync> ValidatorChain<T> {
    /// Run every validator against `value`.
    ///
    /// # Errors
    ///
    /// Returns the first rejection to resolve.
    pub async fn run(&self, value: &T) -> Result<(), CommandError> {
        let pending: Vec<_> = self
            .validators
            .iter()
            .map(|validator| validator.validate(value))
            .collect();
        try_join_all(pending).await.map(|_| ())
    }
}

impl<T: ?Sized> Default for ValidatorChain<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> fmt::Debug for ValidatorChain<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidatorChain")
            .field("validators", &self.validators.len())
            .finish()
    }
}

/// Accepts strings that match a regular expression.
///
/// Rejections are logged at ERROR with the offending value and answered
/// with [`CommandError::Standard`] carrying [`INVALID_REQUEST`]. Also
/// validates `Option<String>`, rejecting `None`.
#[derive(Clone)]
pub struct RegexValidator {
    pattern: Regex,
    logger: Option<Arc<dyn Logger>>,
}

impl RegexValidator {
    /// Validator for an already compiled pattern.
    #[must_use]
    pub const fn new(pattern: Regex) -> Self {
        Self {
            pattern,
            logger: None,
        }
    }

    /// Compile `expression` into a validator.
    ///
    /// # Errors
    ///
    /// Returns [`regex::Error`] if the expression does not compile.
    pub fn parse(expression: &str) -> Result<Self, regex::Error> {
        Regex::new(expression).map(Self::new)
    }

    fn check(&self, value: Option<&str>) -> Result<(), CommandError> {
        if value.is_some_and(|value| self.pattern.is_match(value)) {
            return Ok(());
        }
        if let Some(logger) = &self.logger {
            logger.error(&format_args!(
                "Invalid input: {} does not match |{}|",
                value.unwrap_or("<none>"),
                self.pattern.as_str()
            ));
        }
        Err(CommandError::standard(INVALID_REQUEST))
    }
}

impl fmt::Debug for RegexValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegexValidator")
            .field("pattern", &self.pattern.as_str())
            .field("logger", &self.logger.is_some())
            .finish()
    }
}

impl Validator<String> for RegexValidator {
    fn validate<'a>(&'a self, value: &'a String) -> BoxFuture<'a, Result<(), CommandError>> {
        Box::pin(async move { self.check(Some(value)) })
    }

    fn attach_logger(&mut self, logger: Arc<dyn Logger>) {
        self.logger = Some(logger);
    }
}

impl Validator<Option<String>> for RegexValidator {
    fn validate<'a>(&'a self, value: &'a Option<String>) -> BoxFuture<'a, Result<(), CommandError>> {
        Box::pin(async move { self.check(value.as_deref()) })
    }

    fn attach_logger(&mut self, logger: Arc<dyn Logger>) {
        self.logger = Some(logger);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting {
        calls: Arc<AtomicUsize>,
        reject_with: Option<CommandError>,
    }

    impl Validator<u32> for Counting {
        fn validate<'a>(&'a self, _value: &'a u32) -> BoxFuture<'a, Result<(), CommandError>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let outcome = self.reject_with.clone().map_or(Ok(()), Err);
            Box::pin(async move { outcome })
        }
    }

    fn counting(calls: &Arc<AtomicUsize>, reject_with: Option<CommandError>) -> Box<dyn Validator<u32>> {
        Box::new(Counting {
            calls: Arc::clone(calls),
            reject_with,
        })
    }

    #[test]
    fn test_empty_chain_passes() {
        let chain = ValidatorChain::<u32>::new();
        assert!(tokio_test::block_on(chain.run(&1)).is_ok());
    }

    #[test]
    fn test_every_validator_invoked_once_even_when_one_rejects() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut chain = ValidatorChain::new();
        chain.push(counting(&calls, Some(CommandError::input_validation("first"))));
        chain.push(counting(&calls, None));
        chain.push(counting(&calls, Some(CommandError::input_validation("second"))));

        let result = tokio_test::block_on(chain.run(&7));

        assert_eq!(result, Err(CommandError::input_validation("first")));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_regex_validator_accepts_match() {
        let validator = RegexValidator::parse(r"^[0-9a-f-]{36}$").unwrap();
        let id = "6f1c2d3e-0000-4000-8000-1234567890ab".to_string();
        assert!(tokio_test::block_on(Validator::<String>::validate(&validator, &id)).is_ok());
    }

    #[test]
    fn test_regex_validator_rejects_mismatch_as_standard() {
        let validator = RegexValidator::parse(r"^\d+$").unwrap();
        let result = tokio_test::block_on(Validator::<String>::validate(&validator, &"abc".to_string()));
        assert_eq!(result, Err(CommandError::standard(INVALID_REQUEST)));
    }

    #[test]
    fn test_regex_validator_rejects_missing_optional() {
        let validator = RegexValidator::parse(".*").unwrap();
        let none: Option<String> = None;
        let some = Some(String::new());

        assert!(tokio_test::block_on(Validator::<Option<String>>::validate(&validator, &none)).is_err());
        assert!(tokio_test::block_on(Validator::<Option<String>>::validate(&validator, &some)).is_ok());
    }
}
