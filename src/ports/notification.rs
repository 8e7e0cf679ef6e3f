//! Notification ports - the delivery log and the outbound transports.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::foundation::{DomainError, NotificationId, Page, PageRequest, Timestamp, TrainerId};
use crate::domain::notification::{Channel, Notification, NotificationStatus};

#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn insert(&self, notification: &Notification) -> Result<(), DomainError>;

    async fn update(&self, notification: &Notification) -> Result<(), DomainError>;

    async fn find_by_id(&self, id: NotificationId) -> Result<Option<Notification>, DomainError>;

    /// Newest first.
    async fn list(
        &self,
        trainer_id: TrainerId,
        channel: Option<Channel>,
        status: Option<NotificationStatus>,
        page: PageRequest,
    ) -> Result<Page<Notification>, DomainError>;

    /// Whether a sent notification with this dedup key exists for the trainer.
    async fn exists_sent_with_key(&self, trainer_id: TrainerId, dedup_key: &str) -> Result<bool, DomainError>;

    /// Resets failed rows to pending with a blank error. Returns the ids reset.
    async fn requeue_failed(&self, now: Timestamp) -> Result<Vec<NotificationId>, DomainError>;
}

/// Transport-level failure. Never surfaced to API callers.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("{0} transport is not configured")]
    NotConfigured(&'static str),

    #[error("provider rejected the message ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("provider request failed: {0}")]
    Request(String),

    #[error("provider did not answer within {0}s")]
    Timeout(u64),
}

/// A message ready to hand to a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub recipient: String,
    pub subject: Option<String>,
    pub body: String,
    /// Sender display name (the trainer's business).
    pub from_name: Option<String>,
}

/// Provider reference of an accepted message, if the provider returns one.
pub type ProviderRef = Option<String>;

#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, message: &OutboundMessage) -> Result<ProviderRef, TransportError>;
}

#[async_trait]
pub trait SmsSender: Send + Sync {
    async fn send(&self, message: &OutboundMessage) -> Result<ProviderRef, TransportError>;
}
