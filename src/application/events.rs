//! After-commit event publishing.

use crate::domain::foundation::EventEnvelope;
use crate::domain::workflow::TenantEvent;
use crate::ports::EventPublisher;

/// Publishes events whose originating writes have already committed.
///
/// Failures are logged and swallowed: the caller's operation succeeded
/// and must not be reported as failed because a subscriber did.
pub async fn publish_after_commit(publisher: &dyn EventPublisher, events: Vec<TenantEvent>) {
    for event in events {
        let envelope = match EventEnvelope::from_event(&event) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::error!(event_type = event.kind.as_str(), error = %e, "failed to serialize event");
                continue;
            }
        };
        let event_id = envelope.event_id;
        if let Err(e) = publisher.publish(envelope).await {
            tracing::warn!(
                event_type = event.kind.as_str(),
                event_id = %event_id,
                trainer_id = %event.trainer_id,
                error = %e,
                "event publish failed after commit"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::events::LocalEventBus;
    use crate::domain::foundation::{Timestamp, TrainerId};

    #[tokio::test]
    async fn publishes_each_event_as_an_envelope() {
        let bus = LocalEventBus::with_capture();
        let trainer = TrainerId::new();
        publish_after_commit(&bus, vec![TenantEvent::tenant_deleted(trainer, Timestamp::now())]).await;

        let published = bus.events_of_type("tenant_deleted");
        assert_eq!(published.len(), 1);
        let event: TenantEvent = published[0].payload_as().unwrap();
        assert_eq!(event.trainer_id, trainer);
    }
}
