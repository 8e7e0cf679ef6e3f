//! Transport that keeps sent messages in memory.
//!
//! Useful in tests: configure failures with `failing`, inspect what was
//! handed over with `sent`.

use async_trait::async_trait;
use std::sync::{Arc, Mutex, PoisonError};

use crate::ports::{EmailSender, OutboundMessage, ProviderRef, SmsSender, TransportError};

#[derive(Debug, Clone, Default)]
pub struct RecordingTransport {
    sent: Arc<Mutex<Vec<OutboundMessage>>>,
    failure: Option<TransportError>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// A transport whose every send fails with `error`.
    pub fn failing(error: TransportError) -> Self {
        Self {
            sent: Arc::default(),
            failure: Some(error),
        }
    }

    pub fn sent(&self) -> Vec<OutboundMessage> {
        self.sent.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn record(&self, message: &OutboundMessage) -> Result<ProviderRef, TransportError> {
        if let Some(error) = &self.failure {
            return Err(error.clone());
        }
        let mut sent = self.sent.lock().unwrap_or_else(PoisonError::into_inner);
        sent.push(message.clone());
        Ok(Some(format!("rec-{}", sent.len())))
    }
}

#[async_trait]
impl EmailSender for RecordingTransport {
    async fn send(&self, message: &OutboundMessage) -> Result<ProviderRef, TransportError> {
        self.record(message)
    }
}

#[async_trait]
impl SmsSender for RecordingTransport {
    async fn send(&self, message: &OutboundMessage) -> Result<ProviderRef, TransportError> {
        self.record(message)
    }
}
