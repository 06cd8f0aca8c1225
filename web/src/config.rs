//! Handler configuration.

use crate::cors::CorsConfig;
use commander_core::EnvSource;

/// Everything a [`Handler`](crate::Handler) reads from its surroundings.
///
/// Resolved once by whoever assembles the handler; the handler itself
/// never touches the process environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HandlerConfig {
    /// CORS allow-lists.
    pub cors: CorsConfig,
}

impl HandlerConfig {
    /// Configuration with the given CORS allow-lists.
    #[must_use]
    pub const fn new(cors: CorsConfig) -> Self {
        Self { cors }
    }

    /// Load configuration from `source`.
    ///
    /// Missing variables are logged and replaced by empty allow-lists.
    ///
    /// # Example
    ///
    /// ```
    /// use commander_core::ProcessEnv;
    /// use commander_web::HandlerConfig;
    ///
    /// let config = HandlerConfig::from_env(&ProcessEnv);
    /// ```
    #[must_use]
    pub fn from_env(source: &impl EnvSource) -> Self {
        Self {
            cors: CorsConfig::from_env(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cors::{METHODS_VAR, ORIGINS_VAR};
    use std::collections::HashMap;

    #[test]
    fn test_from_env() {
        let mut env = HashMap::new();
        env.insert(ORIGINS_VAR.to_string(), "https://app.example".to_string());
        env.insert(METHODS_VAR.to_string(), "GET".to_string());

        let config = HandlerConfig::from_env(&env);
        assert_eq!(config, HandlerConfig::new(CorsConfig::new(["https://app.example"], ["GET"])));
    }
}
