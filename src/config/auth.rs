//! Authentication configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::error::ValidationError;
use super::server::Environment;

const DEVELOPMENT_SECRET: &str = "coachdesk-development-token-secret-change-me";

/// Opaque token settings.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// HMAC key for token digests. Rotating it invalidates every token.
    #[serde(default = "default_token_secret")]
    pub token_secret: SecretString,

    /// Session token lifetime. Unset issues non-expiring tokens.
    pub session_ttl_hours: Option<i64>,

    #[serde(default = "default_impersonation_ttl")]
    pub impersonation_ttl_minutes: i64,
}

impl AuthConfig {
    pub fn validate(&self, environment: &Environment) -> Result<(), ValidationError> {
        let secret = self.token_secret.expose_secret();
        if secret.len() < 32 {
            return Err(ValidationError::WeakTokenSecret);
        }
        if *environment == Environment::Production && secret == DEVELOPMENT_SECRET {
            return Err(ValidationError::DefaultTokenSecretInProduction);
        }
        Ok(())
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_secret: default_token_secret(),
            session_ttl_hours: None,
            impersonation_ttl_minutes: default_impersonation_ttl(),
        }
    }
}

fn default_token_secret() -> SecretString {
    SecretString::new(DEVELOPMENT_SECRET.to_string())
}

fn default_impersonation_ttl() -> i64 {
    60
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn development_defaults_are_valid_outside_production() {
        let config = AuthConfig::default();
        assert!(config.validate(&Environment::Development).is_ok());
        assert!(config.validate(&Environment::Production).is_err());
        assert_eq!(config.impersonation_ttl_minutes, 60);
    }

    #[test]
    fn short_secrets_are_rejected() {
        let config = AuthConfig {
            token_secret: SecretString::new("short".into()),
            ..Default::default()
        };
        assert!(config.validate(&Environment::Development).is_err());
    }
}
