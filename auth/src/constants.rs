//! Authentication constants.

/// Header carrying the caller's credential.
pub const AUTHORIZATION_HEADER: &str = "Authorization";

/// Scheme prefix a credential must carry, including the separating space.
pub const BEARER_PREFIX: &str = "Bearer ";
