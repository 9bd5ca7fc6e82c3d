use crate::gate::DEFAULT_COOKIE_NAME;
use config::{Config, Environment};
use serde::{Deserialize, Serialize};

/// Runtime configuration for the auth layer.
///
/// Every field has a default suitable for the in-memory setup, so the
/// zero-configuration path is `AuthConfig::default()`. Deployments override
/// via `AUTH_*` environment variables.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Name of the browser cookie holding the session token.
    pub cookie_name: String,
    /// Session lifetime in hours; the cookie expiry matches it.
    pub session_ttl_hours: u32,
    /// Connection parameters for an external credential/session backend.
    /// `None` selects the in-memory backends.
    pub database: Option<DatabaseConfig>,
}

/// Connection parameters for the relational backend variant.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database server host.
    pub host: String,
    /// Database user.
    pub user: String,
    /// Database password.
    pub password: String,
    /// Database name.
    pub database: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            cookie_name: DEFAULT_COOKIE_NAME.to_owned(),
            session_ttl_hours: 24,
            database: None,
        }
    }
}

impl AuthConfig {
    /// Load configuration from the environment.
    ///
    /// Variables are prefixed with `AUTH` and nested fields use `__`:
    /// `AUTH_COOKIE_NAME`, `AUTH_SESSION_TTL_HOURS`, `AUTH_DATABASE__HOST`,
    /// `AUTH_DATABASE__USER`, `AUTH_DATABASE__PASSWORD`,
    /// `AUTH_DATABASE__DATABASE`. Missing variables fall back to defaults.
    pub fn load() -> Result<Self, config::ConfigError> {
        Config::builder()
            .add_source(Environment::with_prefix("AUTH").separator("__"))
            .build()?
            .try_deserialize()
    }

    /// Load from the environment, falling back to defaults if it is
    /// malformed.
    pub fn from_env() -> Self {
        match Self::load() {
            Ok(config) => config,
            Err(error) => {
                tracing::warn!("failed to load configuration from environment: {error}");
                tracing::info!("falling back to default configuration");
                Self::default()
            }
        }
    }

    /// The session lifetime as a duration.
    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.session_ttl_hours.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_select_the_in_memory_setup() {
        let config = AuthConfig::default();
        assert_eq!(config.cookie_name, DEFAULT_COOKIE_NAME);
        assert_eq!(config.session_ttl_hours, 24);
        assert_eq!(config.session_ttl(), chrono::Duration::hours(24));
        assert!(config.database.is_none());
    }
}
