//! # Commander Core
//!
//! Core contracts for the Commander request pipeline.
//!
//! A serverless HTTP entry point receives one [`RequestEvent`] and must
//! produce exactly one [`Response`]. Between the two sits a
//! [`Command`]: a unit of business logic with an authentication step and a
//! per-invocation lifecycle. This crate defines the pieces the pipeline is
//! built from; the orchestration itself lives in `commander-web`.
//!
//! ## Core Concepts
//!
//! - **Event / Response**: transport data model ([`http`])
//! - **Taxonomy**: classified failures that render themselves ([`error`])
//! - **Logger**: severity-tagged logging plus operator alerts ([`logging`], [`alert`])
//! - **Validator**: pre/postcondition checks, run concurrently per phase ([`validator`])
//! - **Command**: business logic and its lifecycle ([`command`])
//! - **Repository**: persistence contract consumed by commands ([`repository`])
//! - **Config**: injectable environment lookups ([`config`])
//!
//! ## Example
//!
//! ```ignore
//! use commander_core::*;
//!
//! struct GetAsset<R> { assets: R }
//!
//! impl<R: ReadOnlyRepository<Asset>> Operation for GetAsset<R> {
//!     type Input = Option<String>;
//!     type Output = Asset;
//!     type Identity = User;
//!
//!     async fn execute(&self, _scope: Scope<'_, User>, id: Option<String>) -> Result<Asset> {
//!         let id = id.ok_or_else(|| CommandError::input_validation("id is required"))?;
//!         Ok(self.assets.get(&id).await?)
//!     }
//! }
//!
//! let command = Anonymous::new(GetAsset { assets }, Arc::new(TracingLogger::new()));
//! ```

pub mod alert;
pub mod command;
pub mod config;
pub mod error;
pub mod http;
pub mod logging;
pub mod repository;
pub mod validator;

// Re-export commonly used types
pub use alert::{Alert, AlertConfig, AlertError, AlertSink, WebhookAlertSink};
pub use command::{Anonymous, Command, Lifecycle, Operation, RolePolicy, Scope, Stage};
pub use config::{ConfigError, EnvSource, ProcessEnv};
pub use error::{CommandError, PipelineError, Result};
pub use crate::http::{HeaderValue, Headers, RequestEvent, Response};
pub use logging::{Logger, Severity, TracingLogger};
pub use repository::{Identifiable, ReadOnlyRepository, Repository, RepositoryError};
pub use validator::{RegexValidator, Validator, ValidatorChain};
