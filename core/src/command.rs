//! Commands: one unit of business logic per request.
//!
//! # Architecture
//!
//! Business logic is written as an [`Operation`]: a stateless `execute`
//! that receives its input plus a [`Scope`] (logger, resolved identity,
//! role policy). An operation is wrapped in one of two [`Command`]
//! variants chosen at construction:
//!
//! - [`Anonymous`]: authentication is a no-op; anyone may call it.
//! - `Authenticated` (in `commander-auth`): a bearer credential must
//!   resolve to an identity before the operation runs.
//!
//! The command owns the per-invocation state and its lifecycle:
//!
//! ```text
//! Idle ──authenticate──▶ Authenticating ──run──▶ Running
//!   ▲                                               │
//!   └────────────────────── clean ──────────────────┘
//! ```
//!
//! `clean` is the only way back to `Idle` and must be called before every
//! invocation; it drops the invocation logger and any resolved identity.
//!
//! # Reuse
//!
//! Commands are driven through `&mut self`, so one instance can only ever
//! serve one invocation at a time. Sharing an instance across concurrent
//! invocations requires the caller to serialize access.

use crate::error::{CommandError, INVALID_TOKEN, Result};
use crate::http::RequestEvent;
use crate::logging::Logger;
use crate::repository::Identifiable;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Message used when a role check fails.
pub const INSUFFICIENT_ROLE: &str = "Insufficient permissions";

/// Role every default [`RolePolicy`] allows.
pub const ADMIN_ROLE: &str = "admin";

/// Where a command is in its per-invocation lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Stage {
    /// Reset and ready for a new invocation.
    #[default]
    Idle,
    /// Authentication has started.
    Authenticating,
    /// Business logic has started.
    Running,
}

/// Per-invocation bookkeeping shared by the command variants.
///
/// Holds the logger supplied at construction, the logger supplied for the
/// current invocation (cleared by [`reset`](Self::reset)), and the stage.
#[derive(Clone)]
pub struct Lifecycle {
    base_logger: Arc<dyn Logger>,
    invocation_logger: Option<Arc<dyn Logger>>,
    stage: Stage,
}

impl Lifecycle {
    /// New lifecycle in [`Stage::Idle`].
    #[must_use]
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self {
            base_logger: logger,
            invocation_logger: None,
            stage: Stage::Idle,
        }
    }

    /// Logger for the current invocation, or the construction-time logger.
    #[must_use]
    pub fn logger(&self) -> &dyn Logger {
        self.invocation_logger
            .as_deref()
            .unwrap_or_else(|| self.base_logger.as_ref())
    }

    /// Use `logger` until the next reset.
    pub fn set_logger(&mut self, logger: Arc<dyn Logger>) {
        self.invocation_logger = Some(logger);
    }

    /// Current stage.
    #[must_use]
    pub const fn stage(&self) -> Stage {
        self.stage
    }

    /// Move to `stage`.
    pub const fn enter(&mut self, stage: Stage) {
        self.stage = stage;
    }

    /// Back to [`Stage::Idle`], dropping the invocation logger.
    pub fn reset(&mut self) {
        self.invocation_logger = None;
        self.stage = Stage::Idle;
    }
}

impl fmt::Debug for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lifecycle")
            .field("stage", &self.stage)
            .field("invocation_logger", &self.invocation_logger.is_some())
            .finish_non_exhaustive()
    }
}

/// Allow-list of roles permitted to perform privileged actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RolePolicy {
    allowed: Vec<String>,
}

impl RolePolicy {
    /// Policy allowing exactly `allowed`.
    #[must_use]
    pub fn new<I, S>(allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed: allowed.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether any of `claimed` is on the allow-list.
    #[must_use]
    pub fn permits<R: AsRef<str>>(&self, claimed: &[R]) -> bool {
        claimed
            .iter()
            .any(|role| self.allowed.iter().any(|allowed| allowed == role.as_ref()))
    }
}

impl Default for RolePolicy {
    fn default() -> Self {
        Self::new([ADMIN_ROLE])
    }
}

/// What an operation can see while it runs.
pub struct Scope<'a, I> {
    logger: &'a dyn Logger,
    identity: Option<&'a I>,
    roles: &'a RolePolicy,
}

impl<'a, I> Scope<'a, I> {
    /// Assemble a scope.
    #[must_use]
    pub fn new(logger: &'a dyn Logger, identity: Option<&'a I>, roles: &'a RolePolicy) -> Self {
        Self {
            logger,
            identity,
            roles,
        }
    }

    /// Invocation logger.
    #[must_use]
    pub fn logger(&self) -> &'a dyn Logger {
        self.logger
    }

    /// The authenticated identity.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::Authorisation`] if no identity was resolved.
    pub fn identity(&self) -> Result<&'a I, CommandError> {
        self.identity
            .ok_or_else(|| CommandError::authorisation(INVALID_TOKEN))
    }

    /// Whether an identity was resolved.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }
}

impl<I: Identifiable> Scope<'_, I> {
    /// Require one of `claimed` roles to be on the allow-list.
    ///
    /// This check is never run by the pipeline; operations call it for the
    /// actions that need it.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::Authorisation`] if no claimed role is allowed,
    /// or if there is no identity to attribute the attempt to. A denied
    /// attempt is logged at SECURITY with the identity and action.
    pub fn check_role<R: AsRef<str>>(&self, claimed: &[R], action: &str) -> Result<(), CommandError> {
        if self.roles.permits(claimed) {
            return Ok(());
        }
        let identity = self.identity()?;
        self.logger.security(&format_args!(
            "Attempt to {action} by unauthorised user {}",
            identity.id()
        ));
        Err(CommandError::authorisation(INSUFFICIENT_ROLE))
    }
}

impl<I> Clone for Scope<'_, I> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<I> Copy for Scope<'_, I> {}

impl<I: fmt::Debug> fmt::Debug for Scope<'_, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("identity", &self.identity)
            .field("roles", &self.roles)
            .finish_non_exhaustive()
    }
}

/// Business logic of a command.
///
/// Failures from collaborators (repositories, upstream calls) may be passed
/// through untouched with `?`; the pipeline classifies them later.
pub trait Operation: Send + Sync {
    /// Input produced by the event mapper.
    type Input: Send;
    /// Output serialized into the response body.
    type Output: Send;
    /// Identity type resolved by authenticated commands.
    type Identity: Send + Sync;

    /// Execute the business logic.
    ///
    /// # Errors
    ///
    /// Returns a classified or unclassified [`PipelineError`](crate::PipelineError).
    fn execute(
        &self,
        scope: Scope<'_, Self::Identity>,
        input: Self::Input,
    ) -> impl Future<Output = Result<Self::Output>> + Send;
}

/// A command as driven by the handler.
pub trait Command: Send {
    /// Input type.
    type Input: Send;
    /// Output type.
    type Output: Send;

    /// Current lifecycle stage.
    fn stage(&self) -> Stage;

    /// Use `logger` for the current invocation.
    fn set_logger(&mut self, logger: Arc<dyn Logger>);

    /// Clear all per-invocation state and return to [`Stage::Idle`].
    fn clean(&mut self);

    /// Establish who is calling, from the raw event.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::Authorisation`] if the caller is not accepted.
    fn authenticate(&mut self, event: &RequestEvent) -> impl Future<Output = Result<()>> + Send;

    /// Execute the business logic.
    ///
    /// # Errors
    ///
    /// Returns whatever the operation fails with.
    fn run(&mut self, input: Self::Input) -> impl Future<Output = Result<Self::Output>> + Send;
}

/// Command that anyone may call.
#[derive(Debug)]
pub struct Anonymous<O> {
    operation: O,
    lifecycle: Lifecycle,
    roles: RolePolicy,
}

impl<O: Operation> Anonymous<O> {
    /// Wrap `operation`.
    #[must_use]
    pub fn new(operation: O, logger: Arc<dyn Logger>) -> Self {
        Self {
            operation,
            lifecycle: Lifecycle::new(logger),
            roles: RolePolicy::default(),
        }
    }

    /// Replace the role allow-list.
    #[must_use]
    pub fn with_roles(mut self, roles: RolePolicy) -> Self {
        self.roles = roles;
        self
    }

    /// The wrapped operation.
    pub const fn operation(&self) -> &O {
        &self.operation
    }
}

impl<O: Operation> Command for Anonymous<O> {
    type Input = O::Input;
    type Output = O::Output;

    fn stage(&self) -> Stage {
        self.lifecycle.stage()
    }

    fn set_logger(&mut self, logger: Arc<dyn Logger>) {
        self.lifecycle.set_logger(logger);
    }

    fn clean(&mut self) {
        self.lifecycle.reset();
    }

    async fn authenticate(&mut self, _event: &RequestEvent) -> Result<()> {
        self.lifecycle.enter(Stage::Authenticating);
        Ok(())
    }

    async fn run(&mut self, input: Self::Input) -> Result<Self::Output> {
        self.lifecycle.enter(Stage::Running);
        let scope = Scope::new(self.lifecycle.logger(), None, &self.roles);
        self.operation.execute(scope, input).await
    }
}
