//! Cross-origin and security response headers.
//!
//! Every non-preflight response carries the [`FIXED_HEADERS`] plus the CORS
//! headers computed by [`CorsConfig::response_headers`]. Preflight responses
//! carry only [`CorsConfig::preflight_headers`].

use commander_core::Headers;
use commander_core::config::{EnvSource, comma_list, from_environment};

/// Variable holding the comma-separated origin allow-list.
pub const ORIGINS_VAR: &str = "CORS_VALID_ORIGINS";

/// Variable holding the comma-separated method allow-list.
pub const METHODS_VAR: &str = "CORS_VALID_METHODS";

/// Request header consulted for the caller's origin.
pub const ORIGIN_HEADER: &str = "Origin";

/// Headers attached to every non-preflight response.
pub const FIXED_HEADERS: [(&str, &str); 7] = [
    ("Content-Type", "application/json"),
    ("Strict-Transport-Security", "max-age=31536000; includeSubDomains;"),
    ("X-Frame-Options", "DENY"),
    ("X-XSS-Protection", "1; mode-block"),
    ("X-Content-Type-Options", "nosniff"),
    ("Cache-Control", "no-cache, no-store, must-revalidate"),
    ("Pragma", "no-cache"),
];

/// `Access-Control-Allow-Headers` value for preflight responses.
///
/// `X-Correlation-ID` is allowed so browser callers can supply the ID that
/// [`crate::telemetry::correlation_id`] reads.
pub const ALLOWED_HEADERS: &str = "Content-Type, Authorization, X-Correlation-ID";

/// `Access-Control-Max-Age` value for preflight responses, in seconds.
pub const MAX_AGE: &str = "600";

/// Method list advertised when none is configured.
pub const FALLBACK_METHODS: &str = "OPTIONS";

/// The [`FIXED_HEADERS`] as a header map.
#[must_use]
pub fn fixed_headers() -> Headers {
    FIXED_HEADERS.into_iter().collect()
}

/// CORS allow-lists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CorsConfig {
    allowed_origins: Vec<String>,
    allowed_methods: Vec<String>,
}

impl CorsConfig {
    /// Create a configuration from explicit allow-lists.
    #[must_use]
    pub fn new<O, M>(allowed_origins: O, allowed_methods: M) -> Self
    where
        O: IntoIterator,
        O::Item: Into<String>,
        M: IntoIterator,
        M::Item: Into<String>,
    {
        Self {
            allowed_origins: allowed_origins.into_iter().map(Into::into).collect(),
            allowed_methods: allowed_methods.into_iter().map(Into::into).collect(),
        }
    }

    /// Read both allow-lists from comma-separated variables.
    ///
    /// Missing variables leave the corresponding list empty.
    #[must_use]
    pub fn from_env(source: &impl EnvSource) -> Self {
        Self {
            allowed_origins: comma_list(&from_environment(source, ORIGINS_VAR, None)),
            allowed_methods: comma_list(&from_environment(source, METHODS_VAR, None)),
        }
    }

    /// Allowed origins, in configured order.
    #[must_use]
    pub fn allowed_origins(&self) -> &[String] {
        &self.allowed_origins
    }

    /// Allowed methods, in configured order.
    #[must_use]
    pub fn allowed_methods(&self) -> &[String] {
        &self.allowed_methods
    }

    /// The origin to echo back.
    ///
    /// The request's `Origin` if it is allow-listed, otherwise the first
    /// allow-listed origin, otherwise the empty string.
    #[must_use]
    pub fn resolve_origin(&self, request_headers: &Headers) -> String {
        let origin = request_headers
            .get_ignore_case(ORIGIN_HEADER)
            .map(ToString::to_string)
            .unwrap_or_default();

        if self.allowed_origins.contains(&origin) {
            return origin;
        }
        self.allowed_origins.first().cloned().unwrap_or_default()
    }

    /// CORS headers for an ordinary response.
    #[must_use]
    pub fn cors_headers(&self, request_headers: &Headers) -> Headers {
        Headers::new()
            .with("Access-Control-Allow-Origin", self.resolve_origin(request_headers))
            .with("Access-Control-Allow-Credentials", true)
    }

    /// Headers for a preflight response.
    #[must_use]
    pub fn preflight_headers(&self, request_headers: &Headers) -> Headers {
        let methods = if self.allowed_methods.is_empty() {
            FALLBACK_METHODS.to_string()
        } else {
            self.allowed_methods.join(",")
        };

        self.cors_headers(request_headers)
            .with("Access-Control-Allow-Methods", methods)
            .with("Access-Control-Allow-Headers", ALLOWED_HEADERS)
            .with("Access-Control-Max-Age", MAX_AGE)
            .with("Vary", ORIGIN_HEADER)
    }

    /// Fixed security headers merged with the CORS headers.
    #[must_use]
    pub fn response_headers(&self, request_headers: &Headers) -> Headers {
        let mut headers = fixed_headers();
        headers.merge(self.cors_headers(request_headers));
        headers
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use commander_core::HeaderValue;
    use std::collections::HashMap;

    fn config() -> CorsConfig {
        CorsConfig::new(["https://a.example", "https://b.example"], ["GET", "POST"])
    }

    #[test]
    fn test_from_env_splits_lists() {
        let env: HashMap<String, String> = [
            (ORIGINS_VAR.to_string(), "https://a.example, https://b.example".to_string()),
            (METHODS_VAR.to_string(), "GET,POST".to_string()),
        ]
        .into_iter()
        .collect();

        assert_eq!(CorsConfig::from_env(&env), config());
    }

    #[test]
    fn test_from_env_missing_is_empty() {
        let cors = CorsConfig::from_env(&HashMap::new());
        assert!(cors.allowed_origins().is_empty());
        assert_eq!(cors.resolve_origin(&Headers::new()), "");
    }

    #[test]
    fn test_preflight_headers() {
        let request = Headers::new().with("origin", "https://b.example");
        let headers = config().preflight_headers(&request);

        assert_eq!(headers.len(), 6);
        assert_eq!(
            headers.get("Access-Control-Allow-Origin"),
            Some(&HeaderValue::from("https://b.example"))
        );
        assert_eq!(
            headers.get("Access-Control-Allow-Methods"),
            Some(&HeaderValue::from("GET,POST"))
        );
        assert_eq!(headers.get("Vary"), Some(&HeaderValue::from("Origin")));
        assert_eq!(
            headers.get("Access-Control-Allow-Headers"),
            Some(&HeaderValue::from(ALLOWED_HEADERS))
        );
        assert!(ALLOWED_HEADERS.contains(crate::telemetry::CORRELATION_ID_HEADER));
        assert!(headers.get("Content-Type").is_none());
    }

    #[test]
    fn test_preflight_without_methods_falls_back() {
        let headers = CorsConfig::default().preflight_headers(&Headers::new());
        assert_eq!(
            headers.get("Access-Control-Allow-Methods"),
            Some(&HeaderValue::from(FALLBACK_METHODS))
        );
    }

    #[test]
    fn test_response_headers_carry_fixed_set() {
        let headers = config().response_headers(&Headers::new());

        assert_eq!(headers.len(), FIXED_HEADERS.len() + 2);
        for (name, value) in FIXED_HEADERS {
            assert_eq!(headers.get(name), Some(&HeaderValue::from(value)));
        }
        assert_eq!(
            headers.get("Access-Control-Allow-Credentials"),
            Some(&HeaderValue::Bool(true))
        );
        assert!(headers.get("Vary").is_none());
    }
}
