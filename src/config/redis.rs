//! Redis settings. Only `/ready` talks to Redis; with no URL the probe is
//! left out.

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RedisConfig {
    #[serde(default)]
    pub url: Option<String>,

    /// Upper bound on connect plus `PING`, in milliseconds.
    #[serde(default)]
    pub probe_timeout_ms: Option<u64>,
}

const DEFAULT_PROBE_TIMEOUT_MS: u64 = 2_000;

impl RedisConfig {
    pub fn endpoint(&self) -> Option<&str> {
        self.url.as_deref().map(str::trim).filter(|u| !u.is_empty())
    }

    pub fn is_configured(&self) -> bool {
        self.endpoint().is_some()
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms.unwrap_or(DEFAULT_PROBE_TIMEOUT_MS).max(100))
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        match self.endpoint() {
            Some(url) if !(url.starts_with("redis://") || url.starts_with("rediss://")) => {
                Err(ValidationError::InvalidRedisUrl)
            }
            _ => Ok(()),
        }
    }
}
