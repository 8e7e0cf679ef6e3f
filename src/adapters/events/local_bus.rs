//! In-process event bus.
//!
//! Handlers run on the publishing task in registration order. A failing
//! handler is logged and does not stop the others; the publish call still
//! reports the failure so callers can log it.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::domain::foundation::{DomainError, ErrorCode, EventEnvelope};
use crate::ports::{EventHandler, EventPublisher, EventSubscriber};

pub struct LocalEventBus {
    handlers: RwLock<HashMap<String, Vec<Arc<dyn EventHandler>>>>,
    /// Copies of published events, kept only when capture is enabled.
    captured: Option<RwLock<Vec<EventEnvelope>>>,
}

impl LocalEventBus {
    pub fn new() -> Self {
        Self {
            handlers: RwLock::new(HashMap::new()),
            captured: None,
        }
    }

    /// A bus that records every published event, for assertions in tests.
    pub fn with_capture() -> Self {
        Self {
            handlers: RwLock::new(HashMap::new()),
            captured: Some(RwLock::new(Vec::new())),
        }
    }

    /// Captured events, oldest first. Empty unless built `with_capture`.
    pub fn published_events(&self) -> Vec<EventEnvelope> {
        self.captured
            .as_ref()
            .map(|c| c.read().unwrap_or_else(PoisonError::into_inner).clone())
            .unwrap_or_default()
    }

    pub fn events_of_type(&self, event_type: &str) -> Vec<EventEnvelope> {
        self.published_events()
            .into_iter()
            .filter(|e| e.event_type == event_type)
            .collect()
    }

    pub fn handler_count(&self, event_type: &str) -> usize {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(event_type)
            .map_or(0, Vec::len)
    }
}

impl Default for LocalEventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventPublisher for LocalEventBus {
    async fn publish(&self, event: EventEnvelope) -> Result<(), DomainError> {
        if let Some(captured) = &self.captured {
            captured
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .push(event.clone());
        }

        // Release the lock before awaiting handlers.
        let handlers: Vec<Arc<dyn EventHandler>> = self
            .handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&event.event_type)
            .cloned()
            .unwrap_or_default();

        let mut failures = Vec::new();
        for handler in handlers {
            if let Err(e) = handler.handle(&event).await {
                tracing::warn!(
                    handler = handler.name(),
                    event_type = %event.event_type,
                    event_id = %event.event_id,
                    trainer_id = %event.tenant,
                    error = %e,
                    "event handler failed"
                );
                failures.push(format!("{}: {}", handler.name(), e));
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(DomainError::new(
                ErrorCode::InternalError,
                format!("event handlers failed: {}", failures.join(", ")),
            ))
        }
    }
}

impl EventSubscriber for LocalEventBus {
    fn subscribe(&self, event_type: &str, handler: Arc<dyn EventHandler>) {
        self.handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(event_type.to_string())
            .or_default()
            .push(handler);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::TrainerId;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl EventHandler for Counting {
        async fn handle(&self, _event: &EventEnvelope) -> Result<(), DomainError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(DomainError::internal("nope"))
            } else {
                Ok(())
            }
        }

        fn name(&self) -> &'static str {
            "Counting"
        }
    }

    fn envelope(event_type: &str) -> EventEnvelope {
        EventEnvelope::new(event_type, TrainerId::new(), json!({}))
    }

    #[tokio::test]
    async fn routes_by_event_type() {
        let bus = LocalEventBus::with_capture();
        let handler = Arc::new(Counting { calls: AtomicUsize::new(0), fail: false });
        bus.subscribe_all(&["booking_created", "client_created"], handler.clone());

        bus.publish(envelope("booking_created")).await.unwrap();
        bus.publish(envelope("client_created")).await.unwrap();
        bus.publish(envelope("payment_received")).await.unwrap();

        assert_eq!(handler.calls.load(Ordering::SeqCst), 2);
        assert_eq!(bus.published_events().len(), 3);
        assert_eq!(bus.events_of_type("client_created").len(), 1);
    }

    #[tokio::test]
    async fn failing_handler_does_not_stop_others() {
        let bus = LocalEventBus::new();
        let failing = Arc::new(Counting { calls: AtomicUsize::new(0), fail: true });
        let healthy = Arc::new(Counting { calls: AtomicUsize::new(0), fail: false });
        bus.subscribe("booking_created", failing.clone());
        bus.subscribe("booking_created", healthy.clone());

        assert!(bus.publish(envelope("booking_created")).await.is_err());
        assert_eq!(healthy.calls.load(Ordering::SeqCst), 1);
        assert!(bus.published_events().is_empty());
    }
}
