//! SMS configuration

use secrecy::SecretString;
use serde::Deserialize;

use super::email::default_send_timeout;
use super::error::ValidationError;

/// Twilio settings. All three credentials enable SMS; none disables it.
#[derive(Debug, Clone, Deserialize)]
pub struct SmsConfig {
    pub twilio_account_sid: Option<String>,
    pub twilio_auth_token: Option<SecretString>,
    pub twilio_from_number: Option<String>,

    #[serde(default = "default_api_base")]
    pub api_base: String,

    #[serde(default = "default_send_timeout")]
    pub timeout_secs: u64,
}

/// Complete Twilio credentials.
#[derive(Debug, Clone)]
pub struct TwilioCredentials {
    pub account_sid: String,
    pub auth_token: SecretString,
    pub from_number: String,
}

impl SmsConfig {
    pub fn credentials(&self) -> Option<TwilioCredentials> {
        match (&self.twilio_account_sid, &self.twilio_auth_token, &self.twilio_from_number) {
            (Some(sid), Some(token), Some(from)) if !sid.is_empty() && !from.is_empty() => Some(TwilioCredentials {
                account_sid: sid.clone(),
                auth_token: token.clone(),
                from_number: from.clone(),
            }),
            _ => None,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let given = [
            self.twilio_account_sid.is_some(),
            self.twilio_auth_token.is_some(),
            self.twilio_from_number.is_some(),
        ];
        if given.iter().any(|g| *g) && !given.iter().all(|g| *g) {
            return Err(ValidationError::IncompleteTwilioConfig);
        }
        if let Some(sid) = &self.twilio_account_sid {
            if !sid.starts_with("AC") {
                return Err(ValidationError::InvalidTwilioSid);
            }
        }
        Ok(())
    }
}

impl Default for SmsConfig {
    fn default() -> Self {
        Self {
            twilio_account_sid: None,
            twilio_auth_token: None,
            twilio_from_number: None,
            api_base: default_api_base(),
            timeout_secs: default_send_timeout(),
        }
    }
}

fn default_api_base() -> String {
    "https://api.twilio.com".to_string()
}
