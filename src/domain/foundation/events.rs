//! Event plumbing between the domain and the in-process bus.
//!
//! Every event in the system belongs to exactly one trainer, so the
//! envelope routes on the event type and carries the tenant alongside the
//! JSON payload.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use super::{DomainError, EventId, Timestamp, TrainerId};

/// Implemented by events that can be published on the bus.
pub trait DomainEvent: Send + Sync {
    /// Routing key, e.g. "booking_created".
    fn event_type(&self) -> &str;

    /// Trainer whose data produced the event.
    fn tenant(&self) -> TrainerId;

    fn occurred_at(&self) -> Timestamp;

    fn event_id(&self) -> EventId;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub event_id: EventId,
    pub event_type: String,
    pub tenant: TrainerId,
    pub occurred_at: Timestamp,
    pub payload: JsonValue,
}

impl EventEnvelope {
    pub fn new(event_type: impl Into<String>, tenant: TrainerId, payload: JsonValue) -> Self {
        Self {
            event_id: EventId::new(),
            event_type: event_type.into(),
            tenant,
            occurred_at: Timestamp::now(),
            payload,
        }
    }

    pub fn from_event<T>(event: &T) -> Result<Self, DomainError>
    where
        T: DomainEvent + Serialize,
    {
        let payload = serde_json::to_value(event)
            .map_err(|e| DomainError::internal(format!("event serialization failed: {}", e)))?;

        Ok(Self {
            event_id: event.event_id(),
            event_type: event.event_type().to_string(),
            tenant: event.tenant(),
            occurred_at: event.occurred_at(),
            payload,
        })
    }

    pub fn payload_as<T: for<'de> Deserialize<'de>>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.payload.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct SessionLogged {
        id: EventId,
        trainer: TrainerId,
        minutes: u32,
        at: Timestamp,
    }

    impl DomainEvent for SessionLogged {
        fn event_type(&self) -> &str {
            "session_logged"
        }
        fn tenant(&self) -> TrainerId {
            self.trainer
        }
        fn occurred_at(&self) -> Timestamp {
            self.at
        }
        fn event_id(&self) -> EventId {
            self.id
        }
    }

    #[test]
    fn from_event_keeps_identity_and_tenant() {
        let event = SessionLogged {
            id: EventId::new(),
            trainer: TrainerId::new(),
            minutes: 45,
            at: Timestamp::now(),
        };
        let envelope = EventEnvelope::from_event(&event).unwrap();

        assert_eq!(envelope.event_id, event.id);
        assert_eq!(envelope.event_type, "session_logged");
        assert_eq!(envelope.tenant, event.trainer);
        assert_eq!(envelope.payload["minutes"], 45);
        assert_eq!(envelope.payload_as::<SessionLogged>().unwrap(), event);
    }

    #[test]
    fn payload_of_the_wrong_shape_fails_to_decode() {
        let envelope = EventEnvelope::new("session_logged", TrainerId::new(), serde_json::json!({"minutes": "many"}));
        assert!(envelope.payload_as::<SessionLogged>().is_err());
    }
}
