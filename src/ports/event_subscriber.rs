//! EventSubscriber port - routing of published events to handlers.

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::foundation::{DomainError, EventEnvelope};

/// Reacts to published events.
///
/// Handlers run inline on the publishing task, so anything slow (sending
/// mail, calling providers) must be handed to the job queue.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, event: &EventEnvelope) -> Result<(), DomainError>;

    /// Name used in logs.
    fn name(&self) -> &'static str;
}

/// Registration side of the bus.
pub trait EventSubscriber: Send + Sync {
    fn subscribe(&self, event_type: &str, handler: Arc<dyn EventHandler>);

    fn subscribe_all(&self, event_types: &[&str], handler: Arc<dyn EventHandler>) {
        for event_type in event_types {
            self.subscribe(event_type, Arc::clone(&handler));
        }
    }
}

/// Publisher and subscriber in one.
pub trait EventBus: super::EventPublisher + EventSubscriber {}

impl<T: super::EventPublisher + EventSubscriber> EventBus for T {}
