//! Email configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::error::ValidationError;

/// Email configuration (SendGrid). Without an API key mail is disabled and
/// every attempt is logged as failed.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    /// SendGrid API key
    pub sendgrid_api_key: Option<SecretString>,

    /// From email address
    #[serde(default = "default_from_email")]
    pub from_email: String,

    /// Default from name when the trainer has no business name
    #[serde(default = "default_from_name")]
    pub from_name: String,

    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Per-call timeout in seconds
    #[serde(default = "default_send_timeout")]
    pub timeout_secs: u64,
}

impl EmailConfig {
    pub fn api_key(&self) -> Option<&SecretString> {
        self.sendgrid_api_key
            .as_ref()
            .filter(|k| !k.expose_secret().is_empty())
    }

    /// Validate email configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(key) = self.api_key() {
            if !key.expose_secret().starts_with("SG.") {
                return Err(ValidationError::InvalidSendGridKey);
            }
        }
        if !self.from_email.contains('@') {
            return Err(ValidationError::InvalidFromEmail);
        }
        Ok(())
    }
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            sendgrid_api_key: None,
            from_email: default_from_email(),
            from_name: default_from_name(),
            api_base: default_api_base(),
            timeout_secs: default_send_timeout(),
        }
    }
}

fn default_from_email() -> String {
    "noreply@coachdesk.app".to_string()
}

fn default_from_name() -> String {
    "CoachDesk".to_string()
}

fn default_api_base() -> String {
    "https://api.sendgrid.com".to_string()
}

pub(super) fn default_send_timeout() -> u64 {
    10
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_disables_mail() {
        let config = EmailConfig::default();
        assert!(config.api_key().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_key_prefix_is_checked() {
        let config = EmailConfig {
            sendgrid_api_key: Some(SecretString::new("re_xxx".into())),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = EmailConfig {
            sendgrid_api_key: Some(SecretString::new("SG.xxx".into())),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_from_email() {
        let config = EmailConfig {
            from_email: "invalid".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
