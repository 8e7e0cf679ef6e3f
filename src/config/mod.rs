//! Application configuration module
//!
//! Type-safe configuration loaded from environment variables using the
//! `config` and `dotenvy` crates. Variables carry the `COACHDESK` prefix and
//! nested values are separated by double underscores.
//!
//! # Example
//!
//! ```no_run
//! use coachdesk::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod auth;
mod database;
mod email;
mod error;
mod jobs;
mod payment;
mod redis;
mod server;
mod sms;

pub use auth::AuthConfig;
pub use database::{DatabaseConfig, PoolConfig};
pub use email::EmailConfig;
pub use error::{ConfigError, ValidationError};
pub use jobs::JobsConfig;
pub use payment::PaymentConfig;
pub use redis::RedisConfig;
pub use server::{Environment, LogFormat, ServerConfig};
pub use sms::{SmsConfig, TwilioCredentials};

use serde::Deserialize;

/// Root application configuration
///
/// Every section has defaults so a bare development run starts on the
/// in-memory store with transports disabled.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    /// PostgreSQL connection. Empty URL selects the in-memory store.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Redis, used by the readiness probe only
    #[serde(default)]
    pub redis: RedisConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    /// Paddle webhooks
    #[serde(default)]
    pub payment: PaymentConfig,

    /// SendGrid
    #[serde(default)]
    pub email: EmailConfig,

    /// Twilio
    #[serde(default)]
    pub sms: SmsConfig,

    #[serde(default)]
    pub jobs: JobsConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// 1. Loads `.env` if present (development)
    /// 2. Reads variables with the `COACHDESK` prefix
    /// 3. Uses `__` to separate nested values
    ///
    /// # Environment Variable Format
    ///
    /// - `COACHDESK__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `COACHDESK__DATABASE__URL=...` -> `database.url = ...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into the expected types.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("COACHDESK")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.database.validate(self.is_production())?;
        self.redis.validate()?;
        self.auth.validate(&self.server.environment)?;
        self.email.validate()?;
        self.sms.validate()?;
        self.jobs.validate()?;
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // env vars are process-global
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: [&str; 4] = [
        "COACHDESK__DATABASE__URL",
        "COACHDESK__SERVER__PORT",
        "COACHDESK__SERVER__ENVIRONMENT",
        "COACHDESK__PAYMENT__PRO_PRICE_IDS",
    ];

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_bare_environment_loads_defaults() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        let config = AppConfig::load().unwrap();

        assert_eq!(config.server.port, 8080);
        assert!(!config.database.is_configured());
        assert!(config.email.api_key().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_nested_values_are_read() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("COACHDESK__DATABASE__URL", "postgresql://test@localhost/test");
        env::set_var("COACHDESK__SERVER__PORT", "3000");
        env::set_var("COACHDESK__PAYMENT__PRO_PRICE_IDS", "pri_1,pri_2");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.database.connection_url(), Some("postgresql://test@localhost/test"));
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.payment.price_catalog().pro_price_ids.len(), 2);
    }

    #[test]
    fn test_production_requires_database_and_secret() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("COACHDESK__SERVER__ENVIRONMENT", "production");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert!(config.is_production());
        assert!(config.validate().is_err());
    }
}
