//! Bearer credential extraction.

use crate::constants::{AUTHORIZATION_HEADER, BEARER_PREFIX};
use commander_core::Headers;
use std::fmt;

/// A bearer token taken from the `Authorization` header.
///
/// The token text is never printed by `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    /// Extract the token from request headers.
    ///
    /// The header name is matched case-insensitively. The value must have the
    /// shape `Bearer <token>` with a non-empty token on a single line;
    /// anything else counts as absent.
    #[must_use]
    pub fn from_headers(headers: &Headers) -> Option<Self> {
        headers
            .get_ignore_case(AUTHORIZATION_HEADER)?
            .as_text()
            .and_then(Self::parse)
    }

    /// Parse a raw header value.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let token = raw.strip_prefix(BEARER_PREFIX)?;
        if token.is_empty() || token.contains(['\r', '\n']) {
            return None;
        }
        Some(Self(token.to_string()))
    }

    /// The token text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken([REDACTED])")
    }
}

/// Raw `Authorization` header text, for logging rejected attempts.
#[must_use]
pub fn raw_authorization(headers: &Headers) -> String {
    headers
        .get_ignore_case(AUTHORIZATION_HEADER)
        .map(ToString::to_string)
        .unwrap_or_default()
}
