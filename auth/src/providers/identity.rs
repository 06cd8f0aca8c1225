//! Identity lookup trait.

use commander_core::{ReadOnlyRepository, RepositoryError};
use std::future::Future;

/// Read-only identity lookup.
///
/// Resolves the identity behind a credential. Every
/// [`ReadOnlyRepository`] is an identity lookup keyed by item id.
pub trait IdentityLookup<I>: Send + Sync {
    /// Resolve the identity for `query`.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - No identity matches → `RepositoryError::NotFound`
    /// - The store fails → `RepositoryError::Transport`
    fn lookup(&self, query: &str) -> impl Future<Output = Result<I, RepositoryError>> + Send;
}

impl<I, R> IdentityLookup<I> for R
where
    R: ReadOnlyRepository<I>,
{
    fn lookup(&self, query: &str) -> impl Future<Output = Result<I, RepositoryError>> + Send {
        self.get(query)
    }
}
