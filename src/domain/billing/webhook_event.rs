//! Stored billing webhook deliveries.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::domain::foundation::Timestamp;

/// A webhook delivery keyed by the provider's event id.
///
/// `processed` flips to true exactly once, in the same transaction that
/// applies the event's changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookEvent {
    pub event_id: String,
    pub event_type: String,
    pub payload: JsonValue,
    pub processed: bool,
    pub processed_at: Option<Timestamp>,
    pub error_message: Option<String>,
    pub received_at: Timestamp,
}

impl WebhookEvent {
    pub fn received(
        event_id: impl Into<String>,
        event_type: impl Into<String>,
        payload: JsonValue,
        now: Timestamp,
    ) -> Self {
        Self {
            event_id: event_id.into(),
            event_type: event_type.into(),
            payload,
            processed: false,
            processed_at: None,
            error_message: None,
            received_at: now,
        }
    }
}
