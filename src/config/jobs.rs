//! Background job runner configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

#[derive(Debug, Clone, Deserialize)]
pub struct JobsConfig {
    /// Run the job runner inside the server process
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Idle poll interval in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Jobs leased per poll
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,

    /// Lease length; an unfinished job becomes claimable again after it
    #[serde(default = "default_lease_secs")]
    pub lease_secs: i64,

    /// Period of the booking reminder scan
    #[serde(default = "default_reminder_scan_secs")]
    pub reminder_scan_secs: u64,

    /// Period of the webhook retention cleanup
    #[serde(default = "default_cleanup_secs")]
    pub webhook_cleanup_secs: u64,

    /// Processed webhook events older than this are dropped
    #[serde(default = "default_retention_days")]
    pub webhook_retention_days: i64,
}

impl JobsConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn reminder_scan_interval(&self) -> Duration {
        Duration::from_secs(self.reminder_scan_secs)
    }

    pub fn webhook_cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.webhook_cleanup_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.poll_interval_ms == 0 {
            return Err(ValidationError::InvalidJobSetting("poll_interval_ms"));
        }
        if self.batch_size == 0 || self.batch_size > 500 {
            return Err(ValidationError::InvalidJobSetting("batch_size"));
        }
        if self.lease_secs < 10 {
            return Err(ValidationError::InvalidJobSetting("lease_secs"));
        }
        if self.reminder_scan_secs == 0 || self.webhook_cleanup_secs == 0 {
            return Err(ValidationError::InvalidJobSetting("scan interval"));
        }
        if self.webhook_retention_days < 1 {
            return Err(ValidationError::InvalidJobSetting("webhook_retention_days"));
        }
        Ok(())
    }
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            poll_interval_ms: default_poll_interval_ms(),
            batch_size: default_batch_size(),
            lease_secs: default_lease_secs(),
            reminder_scan_secs: default_reminder_scan_secs(),
            webhook_cleanup_secs: default_cleanup_secs(),
            webhook_retention_days: default_retention_days(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_batch_size() -> u32 {
    20
}

fn default_lease_secs() -> i64 {
    300
}

fn default_reminder_scan_secs() -> u64 {
    900
}

fn default_cleanup_secs() -> u64 {
    86_400
}

fn default_retention_days() -> i64 {
    90
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = JobsConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.webhook_retention_days, 90);
        assert_eq!(config.poll_interval(), Duration::from_secs(1));
    }

    #[test]
    fn zero_batch_is_rejected() {
        let config = JobsConfig {
            batch_size: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
