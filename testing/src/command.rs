//! Command double that records its lifecycle.

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity

use commander_core::{
    Command, CommandError, Lifecycle, Logger, PipelineError, RequestEvent, Result, Stage,
};
use std::fmt;
use std::sync::{Arc, Mutex};

/// A lifecycle call observed by [`ScriptedCommand`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    /// `set_logger`
    SetLogger,
    /// `clean`
    Clean,
    /// `authenticate`
    Authenticate,
    /// `run`
    Run,
}

/// Shared, ordered record of lifecycle calls.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<Call>>>);

impl CallLog {
    fn push(&self, call: Call) {
        self.0.lock().unwrap().push(call);
    }

    /// Calls so far, in order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Call> {
        self.0.lock().unwrap().clone()
    }

    /// How often `call` happened.
    #[must_use]
    pub fn count(&self, call: Call) -> usize {
        self.0.lock().unwrap().iter().filter(|seen| **seen == call).count()
    }
}

type Outcome<I, O> = Arc<dyn Fn(I) -> Result<O> + Send + Sync>;
type Gate = Arc<dyn Fn(&RequestEvent) -> Result<()> + Send + Sync>;

/// Command whose authentication and run outcomes are scripted.
///
/// Records every lifecycle call into a [`CallLog`] and every input it runs
/// with, so tests can assert ordering and arguments.
pub struct ScriptedCommand<I, O> {
    calls: CallLog,
    inputs: Arc<Mutex<Vec<I>>>,
    events: Arc<Mutex<Vec<RequestEvent>>>,
    lifecycle: Lifecycle,
    gate: Gate,
    outcome: Outcome<I, O>,
}

impl<I, O> ScriptedCommand<I, O>
where
    I: Clone + Send + 'static,
    O: Send + 'static,
{
    /// Command that authenticates everyone and answers with `outcome`.
    #[must_use]
    pub fn new<F>(logger: Arc<dyn Logger>, outcome: F) -> Self
    where
        F: Fn(I) -> Result<O> + Send + Sync + 'static,
    {
        Self {
            calls: CallLog::default(),
            inputs: Arc::new(Mutex::new(Vec::new())),
            events: Arc::new(Mutex::new(Vec::new())),
            lifecycle: Lifecycle::new(logger),
            gate: Arc::new(|_| Ok(())),
            outcome: Arc::new(outcome),
        }
    }

    /// Command that always answers with `output`.
    #[must_use]
    pub fn returning(logger: Arc<dyn Logger>, output: O) -> Self
    where
        O: Clone + Sync,
    {
        Self::new(logger, move |_| Ok(output.clone()))
    }

    /// Command whose run always fails with `error`.
    #[must_use]
    pub fn failing<F>(logger: Arc<dyn Logger>, error: F) -> Self
    where
        F: Fn() -> PipelineError + Send + Sync + 'static,
    {
        Self::new(logger, move |_| Err(error()))
    }

    /// Reject authentication with `error`.
    #[must_use]
    pub fn rejecting_authentication(mut self, error: CommandError) -> Self {
        self.gate = Arc::new(move |_| Err(error.clone().into()));
        self
    }

    /// Handle on the lifecycle call record.
    #[must_use]
    pub fn calls(&self) -> CallLog {
        self.calls.clone()
    }

    /// Handle on the inputs `run` received.
    #[must_use]
    pub fn inputs(&self) -> Arc<Mutex<Vec<I>>> {
        Arc::clone(&self.inputs)
    }

    /// Handle on the events `authenticate` received.
    #[must_use]
    pub fn events(&self) -> Arc<Mutex<Vec<RequestEvent>>> {
        Arc::clone(&self.events)
    }
}

impl<I, O> Command for ScriptedCommand<I, O>
where
    I: Clone + Send + 'static,
    O: Send + 'static,
{
    type Input = I;
    type Output = O;

    fn stage(&self) -> Stage {
        self.lifecycle.stage()
    }

    fn set_logger(&mut self, logger: Arc<dyn Logger>) {
        self.calls.push(Call::SetLogger);
        self.lifecycle.set_logger(logger);
    }

    fn clean(&mut self) {
        self.calls.push(Call::Clean);
        self.lifecycle.reset();
    }

    async fn authenticate(&mut self, event: &RequestEvent) -> Result<()> {
        self.calls.push(Call::Authenticate);
        self.lifecycle.enter(Stage::Authenticating);
        self.events.lock().unwrap().push(event.clone());
        (self.gate)(event)
    }

    async fn run(&mut self, input: Self::Input) -> Result<Self::Output> {
        self.calls.push(Call::Run);
        self.lifecycle.enter(Stage::Running);
        self.inputs.lock().unwrap().push(input.clone());
        (self.outcome)(input)
    }
}

impl<I, O> fmt::Debug for ScriptedCommand<I, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptedCommand")
            .field("calls", &self.calls)
            .field("lifecycle", &self.lifecycle)
            .finish_non_exhaustive()
    }
}
