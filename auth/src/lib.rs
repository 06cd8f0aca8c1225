//! # Commander Authentication
//!
//! The authenticated command variant for the Commander request pipeline.
//!
//! An [`Authenticated`] command wraps an [`Operation`](commander_core::Operation)
//! and, before the operation runs, resolves the caller's identity from a
//! bearer credential in the raw request event:
//!
//! ```text
//! Authorization: Bearer <token> → IdentityLookup → identity → Scope
//! ```
//!
//! Identity resolution goes through the [`IdentityLookup`] provider trait.
//! Any read-only repository is a lookup, so an assembly usually hands in
//! the same store its other commands use.
//!
//! ## Example
//!
//! ```rust,ignore
//! use commander_auth::Authenticated;
//! use commander_core::TracingLogger;
//!
//! let command = Authenticated::new(DeleteAsset::new(assets), users, Arc::new(TracingLogger::new()))
//!     .allow_bypass(false);
//! ```

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]

pub mod bearer;
pub mod command;
pub mod constants;
pub mod providers;

pub use bearer::BearerToken;
pub use command::Authenticated;
pub use providers::IdentityLookup;
