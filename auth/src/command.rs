//! The authenticated command variant.

use crate::bearer::{BearerToken, raw_authorization};
use crate::providers::IdentityLookup;
use commander_core::error::INVALID_TOKEN;
use commander_core::{
    Command, CommandError, Lifecycle, Logger, Operation, RequestEvent, Result, RolePolicy, Scope,
    Stage,
};
use std::fmt;
use std::sync::Arc;

/// Command that requires a verified identity before its operation runs.
///
/// Authentication reads a bearer credential from the raw event and
/// resolves it through the identity lookup:
///
/// 1. No credential and bypass allowed → succeed anonymously.
/// 2. No credential and bypass not allowed → log the raw header at
///    SECURITY and fail with `Authorisation`.
/// 3. Credential present → resolve the identity. Any lookup failure is
///    logged at ERROR and replaced by `Authorisation`, so the caller never
///    learns why.
///
/// The resolved identity lives until the next [`clean`](Command::clean).
pub struct Authenticated<O: Operation, L> {
    operation: O,
    lookup: L,
    allow_bypass: bool,
    identity: Option<O::Identity>,
    lifecycle: Lifecycle,
    roles: RolePolicy,
}

impl<O, L> Authenticated<O, L>
where
    O: Operation,
    L: IdentityLookup<O::Identity>,
{
    /// Wrap `operation`, resolving identities through `lookup`.
    #[must_use]
    pub fn new(operation: O, lookup: L, logger: Arc<dyn Logger>) -> Self {
        Self {
            operation,
            lookup,
            allow_bypass: false,
            identity: None,
            lifecycle: Lifecycle::new(logger),
            roles: RolePolicy::default(),
        }
    }

    /// Let requests without any credential through anonymously.
    ///
    /// A credential that is present but cannot be resolved is still rejected.
    #[must_use]
    pub const fn allow_bypass(mut self, allow: bool) -> Self {
        self.allow_bypass = allow;
        self
    }

    /// Replace the role allow-list.
    #[must_use]
    pub fn with_roles(mut self, roles: RolePolicy) -> Self {
        self.roles = roles;
        self
    }

    /// The identity resolved for the current invocation.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::Authorisation`] if no credential was resolved.
    pub fn identity(&self) -> Result<&O::Identity, CommandError> {
        self.identity
            .as_ref()
            .ok_or_else(|| CommandError::authorisation(INVALID_TOKEN))
    }

    /// Whether an identity is held for the current invocation.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    /// The wrapped operation.
    pub const fn operation(&self) -> &O {
        &self.operation
    }
}

impl<O, L> Command for Authenticated<O, L>
where
    O: Operation,
    L: IdentityLookup<O::Identity>,
{
    type Input = O::Input;
    type Output = O::Output;

    fn stage(&self) -> Stage {
        self.lifecycle.stage()
    }

    fn set_logger(&mut self, logger: Arc<dyn Logger>) {
        self.lifecycle.set_logger(logger);
    }

    fn clean(&mut self) {
        self.identity = None;
        self.lifecycle.reset();
    }

    async fn authenticate(&mut self, event: &RequestEvent) -> Result<()> {
        self.lifecycle.enter(Stage::Authenticating);

        let Some(token) = BearerToken::from_headers(&event.headers) else {
            if self.allow_bypass {
                tracing::debug!("No credential present, continuing anonymously");
                return Ok(());
            }
            self.lifecycle.logger().security(&format_args!(
                "Invalid Token {}",
                raw_authorization(&event.headers)
            ));
            return Err(CommandError::authorisation(INVALID_TOKEN).into());
        };

        match self.lookup.lookup(token.as_str()).await {
            Ok(identity) => {
                self.identity = Some(identity);
                Ok(())
            }
            Err(err) => {
                self.lifecycle.logger().error(&err);
                Err(CommandError::authorisation(INVALID_TOKEN).into())
            }
        }
    }

    async fn run(&mut self, input: Self::Input) -> Result<Self::Output> {
        self.lifecycle.enter(Stage::Running);
        let scope = Scope::new(self.lifecycle.logger(), self.identity.as_ref(), &self.roles);
        self.operation.execute(scope, input).await
    }
}

impl<O, L> fmt::Debug for Authenticated<O, L>
where
    O: Operation + fmt::Debug,
    O::Identity: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Authenticated")
            .field("operation", &self.operation)
            .field("allow_bypass", &self.allow_bypass)
            .field("identity", &self.identity)
            .field("lifecycle", &self.lifecycle)
            .finish_non_exhaustive()
    }
}
