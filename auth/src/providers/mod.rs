//! Authentication providers.
//!
//! Providers are **interfaces**, not implementations. The authenticated
//! command depends on these traits; the assembly supplies a concrete store
//! (any read-only repository qualifies) and tests supply the in-memory mock.

pub mod identity;

pub use identity::IdentityLookup;
