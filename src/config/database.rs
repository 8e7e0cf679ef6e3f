//! PostgreSQL connection settings.

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

const MAX_POOL_SIZE: u32 = 100;

/// The URL embeds credentials, so it is held as a secret and never logged.
/// Without one the service runs on the in-memory store.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: Option<SecretString>,

    #[serde(default)]
    pub pool: PoolConfig,

    /// Apply the embedded migrations before serving.
    #[serde(default)]
    pub run_migrations: bool,
}

/// Connection pool sizing and recycling, `COACHDESK__DATABASE__POOL__*`.
#[derive(Debug, Clone, Deserialize)]
pub struct PoolConfig {
    #[serde(default = "default_min")]
    pub min: u32,
    #[serde(default = "default_max")]
    pub max: u32,
    #[serde(default = "default_acquire_secs")]
    pub acquire_secs: u64,
    #[serde(default = "default_idle_secs")]
    pub idle_secs: u64,
    #[serde(default = "default_lifetime_secs")]
    pub lifetime_secs: u64,
}

impl DatabaseConfig {
    pub fn connection_url(&self) -> Option<&str> {
        self.url
            .as_ref()
            .map(|u| u.expose_secret().as_str())
            .filter(|u| !u.trim().is_empty())
    }

    pub fn is_configured(&self) -> bool {
        self.connection_url().is_some()
    }

    /// Production refuses to start on the in-memory store.
    pub fn validate(&self, production: bool) -> Result<(), ValidationError> {
        let Some(url) = self.connection_url() else {
            return if production {
                Err(ValidationError::MissingRequired("DATABASE__URL"))
            } else {
                Ok(())
            };
        };
        if !["postgres://", "postgresql://"].iter().any(|scheme| url.starts_with(scheme)) {
            return Err(ValidationError::InvalidDatabaseUrl);
        }
        self.pool.validate()
    }
}

impl PoolConfig {
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_secs)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_secs)
    }

    pub fn max_lifetime(&self) -> Duration {
        Duration::from_secs(self.lifetime_secs)
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.max == 0 || self.min > self.max {
            return Err(ValidationError::InvalidPoolSize);
        }
        if self.max > MAX_POOL_SIZE {
            return Err(ValidationError::PoolSizeTooLarge);
        }
        Ok(())
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            min: default_min(),
            max: default_max(),
            acquire_secs: default_acquire_secs(),
            idle_secs: default_idle_secs(),
            lifetime_secs: default_lifetime_secs(),
        }
    }
}

fn default_min() -> u32 {
    2
}

fn default_max() -> u32 {
    20
}

fn default_acquire_secs() -> u64 {
    10
}

fn default_idle_secs() -> u64 {
    600
}

fn default_lifetime_secs() -> u64 {
    1800
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_url(url: &str) -> DatabaseConfig {
        DatabaseConfig {
            url: Some(SecretString::new(url.to_string())),
            ..Default::default()
        }
    }

    #[test]
    fn blank_url_means_in_memory() {
        assert!(!DatabaseConfig::default().is_configured());
        assert!(!with_url("  ").is_configured());
        assert!(DatabaseConfig::default().validate(false).is_ok());
        assert!(matches!(
            DatabaseConfig::default().validate(true),
            Err(ValidationError::MissingRequired(_))
        ));
    }

    #[test]
    fn only_postgres_urls_are_accepted() {
        assert!(with_url("postgres://coach:pw@db/coachdesk").validate(true).is_ok());
        assert!(matches!(
            with_url("mysql://db/coachdesk").validate(false),
            Err(ValidationError::InvalidDatabaseUrl)
        ));
    }

    #[test]
    fn pool_bounds_are_checked() {
        let mut config = with_url("postgresql://db/coachdesk");
        config.pool.min = 30;
        assert!(matches!(config.validate(false), Err(ValidationError::InvalidPoolSize)));

        config.pool.min = 2;
        config.pool.max = MAX_POOL_SIZE + 1;
        assert!(matches!(config.validate(false), Err(ValidationError::PoolSizeTooLarge)));
    }

    #[test]
    fn debug_output_hides_credentials() {
        let config = with_url("postgres://coach:hunter2@db/coachdesk");
        assert!(!format!("{:?}", config).contains("hunter2"));
    }
}
