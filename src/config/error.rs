//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("Wildcard CORS origin is not allowed in production")]
    WildcardCorsInProduction,

    #[error("Invalid socket address: {0}")]
    InvalidSocketAddr(String),

    #[error("Invalid database URL format")]
    InvalidDatabaseUrl,

    #[error("Invalid Redis URL format")]
    InvalidRedisUrl,

    #[error("Pool min_connections exceeds max_connections")]
    InvalidPoolSize,

    #[error("Pool size exceeds maximum allowed (100)")]
    PoolSizeTooLarge,

    #[error("Token secret must be at least 32 bytes")]
    WeakTokenSecret,

    #[error("Token secret must be set explicitly in production")]
    DefaultTokenSecretInProduction,

    #[error("Invalid SendGrid API key format")]
    InvalidSendGridKey,

    #[error("Invalid from email address")]
    InvalidFromEmail,

    #[error("Twilio account SID must start with AC")]
    InvalidTwilioSid,

    #[error("Twilio settings must be given together (account SID, auth token, from number)")]
    IncompleteTwilioConfig,

    #[error("Invalid job runner setting: {0}")]
    InvalidJobSetting(&'static str),
}
