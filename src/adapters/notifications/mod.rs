//! Outbound message transports.
//!
//! - `SendGridEmailSender` - one POST to `/v3/mail/send`
//! - `TwilioSmsSender` - one POST to the Messages resource
//! - `DisabledTransport` - fails fast when credentials are missing
//! - `RecordingTransport` - in-process transport for tests and local runs

mod disabled;
mod recording;
mod sendgrid;
mod twilio;

use std::sync::Arc;

pub use disabled::DisabledTransport;
pub use recording::RecordingTransport;
pub use sendgrid::SendGridEmailSender;
pub use twilio::TwilioSmsSender;

use crate::config::{EmailConfig, SmsConfig};
use crate::domain::foundation::DomainError;
use crate::ports::{EmailSender, SmsSender, TransportError};

/// SendGrid when an API key is configured, a disabled transport otherwise.
pub fn email_sender_from_config(config: &EmailConfig) -> Result<Arc<dyn EmailSender>, DomainError> {
    match config.api_key() {
        Some(_) => Ok(Arc::new(SendGridEmailSender::new(config)?)),
        None => {
            tracing::warn!("SendGrid API key not set; email delivery is disabled");
            Ok(Arc::new(DisabledTransport::email()))
        }
    }
}

/// Twilio when all credentials are configured, a disabled transport otherwise.
pub fn sms_sender_from_config(config: &SmsConfig) -> Result<Arc<dyn SmsSender>, DomainError> {
    match config.credentials() {
        Some(credentials) => Ok(Arc::new(TwilioSmsSender::new(
            credentials,
            &config.api_base,
            config.timeout_secs,
        )?)),
        None => {
            tracing::warn!("Twilio credentials not set; SMS delivery is disabled");
            Ok(Arc::new(DisabledTransport::sms()))
        }
    }
}

fn http_client(timeout_secs: u64) -> Result<reqwest::Client, DomainError> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| DomainError::internal(format!("Failed to create HTTP client: {}", e)))
}

fn request_error(timeout_secs: u64) -> impl Fn(reqwest::Error) -> TransportError {
    move |e| {
        if e.is_timeout() {
            TransportError::Timeout(timeout_secs)
        } else if e.is_connect() {
            TransportError::Request(format!("Connection failed: {}", e))
        } else {
            TransportError::Request(e.to_string())
        }
    }
}
