//! Twilio Programmable Messaging transport.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::Deserialize;

use super::{http_client, request_error};
use crate::config::TwilioCredentials;
use crate::domain::foundation::DomainError;
use crate::ports::{OutboundMessage, ProviderRef, SmsSender, TransportError};

pub struct TwilioSmsSender {
    client: Client,
    credentials: TwilioCredentials,
    api_base: String,
    timeout_secs: u64,
}

#[derive(Deserialize)]
struct MessageResource {
    sid: Option<String>,
}

impl TwilioSmsSender {
    pub fn new(credentials: TwilioCredentials, api_base: &str, timeout_secs: u64) -> Result<Self, DomainError> {
        Ok(Self {
            client: http_client(timeout_secs)?,
            credentials,
            api_base: api_base.trim_end_matches('/').to_string(),
            timeout_secs,
        })
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.api_base, self.credentials.account_sid
        )
    }
}

#[async_trait]
impl SmsSender for TwilioSmsSender {
    async fn send(&self, message: &OutboundMessage) -> Result<ProviderRef, TransportError> {
        let form = [
            ("To", message.recipient.as_str()),
            ("From", self.credentials.from_number.as_str()),
            ("Body", message.body.as_str()),
        ];
        let response = self
            .client
            .post(self.messages_url())
            .basic_auth(
                &self.credentials.account_sid,
                Some(self.credentials.auth_token.expose_secret()),
            )
            .form(&form)
            .send()
            .await
            .map_err(request_error(self.timeout_secs))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let resource: MessageResource = response
            .json()
            .await
            .map_err(|e| TransportError::Request(format!("Unreadable Twilio response: {}", e)))?;
        Ok(resource.sid)
    }
}
