use async_trait::async_trait;

use crate::ports::{EmailSender, OutboundMessage, ProviderRef, SmsSender, TransportError};

/// Transport used when a channel has no credentials. Every send fails
/// immediately so the attempt is logged as a failed notification.
#[derive(Debug, Clone, Copy)]
pub struct DisabledTransport {
    channel: &'static str,
}

impl DisabledTransport {
    pub fn email() -> Self {
        Self { channel: "email" }
    }

    pub fn sms() -> Self {
        Self { channel: "sms" }
    }
}

#[async_trait]
impl EmailSender for DisabledTransport {
    async fn send(&self, _message: &OutboundMessage) -> Result<ProviderRef, TransportError> {
        Err(TransportError::NotConfigured(self.channel))
    }
}

#[async_trait]
impl SmsSender for DisabledTransport {
    async fn send(&self, _message: &OutboundMessage) -> Result<ProviderRef, TransportError> {
        Err(TransportError::NotConfigured(self.channel))
    }
}
