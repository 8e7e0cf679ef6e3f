use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{NotificationId, Timestamp, TrainerId, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Email,
    Sms,
    Push,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Email => "email",
            Channel::Sms => "sms",
            Channel::Push => "push",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Channel {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "email" => Ok(Channel::Email),
            "sms" => Ok(Channel::Sms),
            "push" => Ok(Channel::Push),
            other => Err(ValidationError::invalid_format("channel", format!("unknown channel '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationStatus {
    Pending,
    Sent,
    Failed,
}

impl NotificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationStatus::Pending => "pending",
            NotificationStatus::Sent => "sent",
            NotificationStatus::Failed => "failed",
        }
    }
}

impl FromStr for NotificationStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(NotificationStatus::Pending),
            "sent" => Ok(NotificationStatus::Sent),
            "failed" => Ok(NotificationStatus::Failed),
            other => Err(ValidationError::invalid_format("status", format!("unknown notification status '{}'", other))),
        }
    }
}

/// One delivery attempt, recorded whatever the outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub trainer_id: TrainerId,
    pub channel: Channel,
    pub recipient: String,
    pub subject: Option<String>,
    pub message: String,
    pub status: NotificationStatus,
    pub provider_ref: Option<String>,
    pub sent_at: Option<Timestamp>,
    pub failed_reason: Option<String>,
    pub dedup_key: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Notification {
    pub fn pending(
        trainer_id: TrainerId,
        channel: Channel,
        recipient: &str,
        subject: Option<String>,
        message: String,
        now: Timestamp,
    ) -> Self {
        let recipient = recipient.trim().to_string();
        let dedup_key = dedup_key(&recipient, subject.as_deref(), &message);
        Self {
            id: NotificationId::new(),
            trainer_id,
            channel,
            recipient,
            subject,
            message,
            status: NotificationStatus::Pending,
            provider_ref: None,
            sent_at: None,
            failed_reason: None,
            dedup_key,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn mark_sent(&mut self, provider_ref: Option<String>, now: Timestamp) {
        self.status = NotificationStatus::Sent;
        self.provider_ref = provider_ref;
        self.sent_at = Some(now);
        self.failed_reason = None;
        self.updated_at = now;
    }

    pub fn mark_failed(&mut self, reason: impl Into<String>, now: Timestamp) {
        self.status = NotificationStatus::Failed;
        self.failed_reason = Some(reason.into());
        self.updated_at = now;
    }

    /// Puts a failed row back in the queue without sending it.
    pub fn requeue(&mut self, now: Timestamp) -> bool {
        if self.status != NotificationStatus::Failed {
            return false;
        }
        self.status = NotificationStatus::Pending;
        self.failed_reason = None;
        self.updated_at = now;
        true
    }
}

/// Hex SHA-256 over recipient, subject and body.
pub fn dedup_key(recipient: &str, subject: Option<&str>, body: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(recipient.as_bytes());
    hasher.update([0u8]);
    hasher.update(subject.unwrap_or_default().as_bytes());
    hasher.update([0u8]);
    hasher.update(body.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedup_key_depends_on_every_part() {
        let base = dedup_key("a@x.io", Some("Hi"), "Body");
        assert_eq!(base.len(), 64);
        assert_eq!(base, dedup_key("a@x.io", Some("Hi"), "Body"));
        assert_ne!(base, dedup_key("b@x.io", Some("Hi"), "Body"));
        assert_ne!(base, dedup_key("a@x.io", None, "Body"));
        assert_ne!(base, dedup_key("a@x.io", Some("HiB"), "ody"));
    }

    #[test]
    fn requeue_only_resets_failed_rows() {
        let now = Timestamp::now();
        let mut n = Notification::pending(TrainerId::new(), Channel::Email, " a@x.io ", Some("s".into()), "m".into(), now);
        assert_eq!(n.recipient, "a@x.io");
        assert!(!n.requeue(now));

        n.mark_failed("timeout", now);
        assert!(n.requeue(now));
        assert_eq!(n.status, NotificationStatus::Pending);
        assert!(n.failed_reason.is_none());
    }
}
