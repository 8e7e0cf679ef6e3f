//! NotificationDispatcher - sends one email or SMS and logs the attempt.
//!
//! Every attempt ends in a terminal Notification row: `sent` with the
//! provider reference, or `failed` with the reason. Transport failures are
//! logged and returned as an outcome, never as an error.

use std::sync::Arc;
use std::time::Duration;

use crate::domain::foundation::{DomainError, NotificationId, Timestamp, TrainerId};
use crate::domain::notification::{Channel, Notification, NotificationStatus};
use crate::ports::{EmailSender, NotificationRepository, OutboundMessage, SmsSender, TransportError};

pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// One message to send.
#[derive(Debug, Clone)]
pub struct MessageRequest {
    pub trainer_id: TrainerId,
    pub channel: Channel,
    pub recipient: String,
    pub subject: Option<String>,
    pub body: String,
    pub from_name: Option<String>,
    /// Skip the send when an identical message was already sent.
    pub dedup: bool,
}

impl MessageRequest {
    pub fn email(trainer_id: TrainerId, recipient: &str, subject: &str, body: String) -> Self {
        Self {
            trainer_id,
            channel: Channel::Email,
            recipient: recipient.to_string(),
            subject: Some(subject.to_string()),
            body,
            from_name: None,
            dedup: false,
        }
    }

    pub fn sms(trainer_id: TrainerId, recipient: &str, body: String) -> Self {
        Self {
            trainer_id,
            channel: Channel::Sms,
            recipient: recipient.to_string(),
            subject: None,
            body,
            from_name: None,
            dedup: false,
        }
    }

    pub fn from_name(mut self, name: &str) -> Self {
        self.from_name = Some(name.to_string());
        self
    }

    pub fn deduplicated(mut self) -> Self {
        self.dedup = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    Sent(Notification),
    Failed(Notification),
    /// An identical message was already sent; nothing was written.
    Duplicate,
}

impl DispatchOutcome {
    pub fn notification(&self) -> Option<&Notification> {
        match self {
            DispatchOutcome::Sent(n) | DispatchOutcome::Failed(n) => Some(n),
            DispatchOutcome::Duplicate => None,
        }
    }
}

#[derive(Clone)]
pub struct NotificationDispatcher {
    notifications: Arc<dyn NotificationRepository>,
    email: Arc<dyn EmailSender>,
    sms: Arc<dyn SmsSender>,
    timeout: Duration,
}

impl NotificationDispatcher {
    pub fn new(
        notifications: Arc<dyn NotificationRepository>,
        email: Arc<dyn EmailSender>,
        sms: Arc<dyn SmsSender>,
    ) -> Self {
        Self {
            notifications,
            email,
            sms,
            timeout: DEFAULT_SEND_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn send(&self, request: MessageRequest) -> Result<DispatchOutcome, DomainError> {
        let now = Timestamp::now();
        let mut notification = Notification::pending(
            request.trainer_id,
            request.channel,
            &request.recipient,
            request.subject,
            request.body,
            now,
        );
        if request.dedup
            && self
                .notifications
                .exists_sent_with_key(notification.trainer_id, &notification.dedup_key)
                .await?
        {
            tracing::debug!(trainer_id = %notification.trainer_id, channel = notification.channel.as_str(), "duplicate notification skipped");
            return Ok(DispatchOutcome::Duplicate);
        }

        let result = self.transmit(&notification, request.from_name).await;
        settle(&mut notification, result, Timestamp::now());
        self.notifications.insert(&notification).await?;
        Ok(outcome(notification))
    }

    /// Delivers a stored pending row. Rows in any other status are left alone.
    pub async fn deliver(&self, id: NotificationId) -> Result<Option<DispatchOutcome>, DomainError> {
        let Some(mut notification) = self.notifications.find_by_id(id).await? else {
            return Err(DomainError::not_found("notification"));
        };
        if notification.status != NotificationStatus::Pending {
            return Ok(None);
        }
        let result = self.transmit(&notification, None).await;
        settle(&mut notification, result, Timestamp::now());
        self.notifications.update(&notification).await?;
        Ok(Some(outcome(notification)))
    }

    async fn transmit(&self, notification: &Notification, from_name: Option<String>) -> Result<Option<String>, TransportError> {
        if notification.recipient.is_empty() {
            return Err(TransportError::Request("recipient is empty".to_string()));
        }
        let message = OutboundMessage {
            recipient: notification.recipient.clone(),
            subject: notification.subject.clone(),
            body: notification.message.clone(),
            from_name,
        };
        let send = async {
            match notification.channel {
                Channel::Email => self.email.send(&message).await,
                Channel::Sms => self.sms.send(&message).await,
                Channel::Push => Err(TransportError::NotConfigured("push")),
            }
        };
        match tokio::time::timeout(self.timeout, send).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout(self.timeout.as_secs())),
        }
    }
}

fn settle(notification: &mut Notification, result: Result<Option<String>, TransportError>, now: Timestamp) {
    match result {
        Ok(provider_ref) => notification.mark_sent(provider_ref, now),
        Err(e) => {
            tracing::warn!(
                trainer_id = %notification.trainer_id,
                channel = notification.channel.as_str(),
                error = %e,
                "notification transport failed"
            );
            notification.mark_failed(e.to_string(), now);
        }
    }
}

fn outcome(notification: Notification) -> DispatchOutcome {
    if notification.status == NotificationStatus::Sent {
        DispatchOutcome::Sent(notification)
    } else {
        DispatchOutcome::Failed(notification)
    }
}
