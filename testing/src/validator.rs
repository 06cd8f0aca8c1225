//! Validator that records what it sees.

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity

use commander_core::{CommandError, Logger, Validator};
use futures::future::BoxFuture;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Validator double.
///
/// Records every value it is invoked with, then (after an optional delay)
/// accepts or rejects with a fixed error. Clones share their records, so a
/// test keeps one clone and registers another.
///
/// `invocations` counts calls to `validate`; `completions` counts calls that
/// ran to the end. A slow validator whose sibling rejected first shows up
/// in the former but not the latter.
#[derive(Clone, Debug)]
pub struct RecordingValidator<T> {
    seen: Arc<Mutex<Vec<T>>>,
    completions: Arc<AtomicUsize>,
    logger_attached: Arc<AtomicBool>,
    rejection: Option<CommandError>,
    delay: Option<Duration>,
}

impl<T> RecordingValidator<T> {
    /// Validator that accepts everything.
    #[must_use]
    pub fn accepting() -> Self {
        Self {
            seen: Arc::new(Mutex::new(Vec::new())),
            completions: Arc::new(AtomicUsize::new(0)),
            logger_attached: Arc::new(AtomicBool::new(false)),
            rejection: None,
            delay: None,
        }
    }

    /// Validator that rejects everything with `error`.
    #[must_use]
    pub fn rejecting(error: CommandError) -> Self {
        Self {
            rejection: Some(error),
            ..Self::accepting()
        }
    }

    /// Wait `delay` before answering.
    #[must_use]
    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of times `validate` was called.
    #[must_use]
    pub fn invocations(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    /// Number of calls that answered.
    #[must_use]
    pub fn completions(&self) -> usize {
        self.completions.load(Ordering::SeqCst)
    }

    /// Whether the owner supplied a logger.
    #[must_use]
    pub fn has_logger(&self) -> bool {
        self.logger_attached.load(Ordering::SeqCst)
    }
}

impl<T: Clone> RecordingValidator<T> {
    /// Values passed to `validate`, in call order.
    #[must_use]
    pub fn seen(&self) -> Vec<T> {
        self.seen.lock().unwrap().clone()
    }
}

impl<T> Validator<T> for RecordingValidator<T>
where
    T: Clone + Send + Sync,
{
    fn validate<'a>(&'a self, value: &'a T) -> BoxFuture<'a, Result<(), CommandError>> {
        self.seen.lock().unwrap().push(value.clone());
        Box::pin(async move {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.completions.fetch_add(1, Ordering::SeqCst);
            match &self.rejection {
                Some(error) => Err(error.clone()),
                None => Ok(()),
            }
        })
    }

    fn attach_logger(&mut self, _logger: Arc<dyn Logger>) {
        self.logger_attached.store(true, Ordering::SeqCst);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use commander_core::ValidatorChain;

    #[tokio::test]
    async fn test_accepting_records_value() {
        let validator = RecordingValidator::accepting();
        let handle = validator.clone();

        validator.validate(&"payload".to_string()).await.unwrap();

        assert_eq!(handle.seen(), vec!["payload".to_string()]);
        assert_eq!(handle.completions(), 1);
    }

    #[tokio::test]
    async fn test_chain_cancels_pending_sibling_on_rejection() {
        let slow = RecordingValidator::<u32>::accepting().delayed(Duration::from_millis(200));
        let failing = RecordingValidator::rejecting(CommandError::input_validation("bad"));

        let mut chain = ValidatorChain::new();
        chain.push(Box::new(slow.clone()));
        chain.push(Box::new(failing.clone()));

        let err = chain.run(&7).await.unwrap_err();

        assert_eq!(err, CommandError::input_validation("bad"));
        assert_eq!(slow.invocations(), 1);
        assert_eq!(failing.invocations(), 1);
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(slow.completions(), 0);
    }
}
