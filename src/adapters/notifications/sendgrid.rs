//! SendGrid v3 mail transport.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

use super::{http_client, request_error};
use crate::config::EmailConfig;
use crate::domain::foundation::DomainError;
use crate::ports::{EmailSender, OutboundMessage, ProviderRef, TransportError};

pub struct SendGridEmailSender {
    client: Client,
    api_key: SecretString,
    api_base: String,
    from_email: String,
    default_from_name: String,
    timeout_secs: u64,
}

#[derive(Serialize)]
struct MailSend<'a> {
    personalizations: [Personalization<'a>; 1],
    from: Address<'a>,
    subject: &'a str,
    content: [Content<'a>; 1],
}

#[derive(Serialize)]
struct Personalization<'a> {
    to: [Address<'a>; 1],
}

#[derive(Serialize)]
struct Address<'a> {
    email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    value: &'a str,
}

impl SendGridEmailSender {
    pub fn new(config: &EmailConfig) -> Result<Self, DomainError> {
        let api_key = config
            .api_key()
            .cloned()
            .ok_or_else(|| DomainError::internal("SendGrid API key is not configured"))?;
        Ok(Self {
            client: http_client(config.timeout_secs)?,
            api_key,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            from_email: config.from_email.clone(),
            default_from_name: config.from_name.clone(),
            timeout_secs: config.timeout_secs,
        })
    }

    fn body<'a>(&'a self, message: &'a OutboundMessage) -> MailSend<'a> {
        MailSend {
            personalizations: [Personalization {
                to: [Address {
                    email: &message.recipient,
                    name: None,
                }],
            }],
            from: Address {
                email: &self.from_email,
                name: Some(message.from_name.as_deref().unwrap_or(&self.default_from_name)),
            },
            subject: message.subject.as_deref().unwrap_or_default(),
            content: [Content {
                kind: "text/plain",
                value: &message.body,
            }],
        }
    }
}

#[async_trait]
impl EmailSender for SendGridEmailSender {
    async fn send(&self, message: &OutboundMessage) -> Result<ProviderRef, TransportError> {
        let response = self
            .client
            .post(format!("{}/v3/mail/send", self.api_base))
            .bearer_auth(self.api_key.expose_secret())
            .json(&self.body(message))
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

        Ok(response
            .headers()
            .get("X-Message-Id")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sender() -> SendGridEmailSender {
        let config = EmailConfig {
            sendgrid_api_key: Some(SecretString::new("SG.test".to_string())),
            ..EmailConfig::default()
        };
        SendGridEmailSender::new(&config).unwrap()
    }

    #[test]
    fn payload_uses_trainer_name_when_given() {
        let sender = sender();
        let message = OutboundMessage {
            recipient: "client@example.com".into(),
            subject: Some("Booking confirmed".into()),
            body: "See you Monday".into(),
            from_name: Some("Iron Gym".into()),
        };
        let json = serde_json::to_value(sender.body(&message)).unwrap();
        assert_eq!(json["personalizations"][0]["to"][0]["email"], "client@example.com");
        assert_eq!(json["from"]["name"], "Iron Gym");
        assert_eq!(json["from"]["email"], "noreply@coachdesk.app");
        assert_eq!(json["content"][0]["type"], "text/plain");
    }

    #[test]
    fn payload_falls_back_to_platform_name() {
        let sender = sender();
        let message = OutboundMessage {
            recipient: "client@example.com".into(),
            subject: None,
            body: "Hi".into(),
            from_name: None,
        };
        let json = serde_json::to_value(sender.body(&message)).unwrap();
        assert_eq!(json["from"]["name"], "CoachDesk");
        assert_eq!(json["subject"], "");
    }

    #[test]
    fn requires_an_api_key() {
        assert!(SendGridEmailSender::new(&EmailConfig::default()).is_err());
    }
}
