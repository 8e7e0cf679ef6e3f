//! CreateBookingHandler - books a client into a free interval.

use std::sync::Arc;

use super::booking_conflict;
use crate::application::events::publish_after_commit;
use crate::application::handlers::entitlement::EntitlementGate;
use crate::domain::foundation::{ClientId, DomainError, Timestamp};
use crate::domain::identity::TenantContext;
use crate::domain::scheduling::Booking;
use crate::domain::workflow::{EventKind, TenantEvent};
use crate::ports::{BookingRepository, BookingWrite, ClientRepository, EventPublisher, TrainerRepository};

#[derive(Debug, Clone)]
pub struct CreateBookingCommand {
    pub client_id: ClientId,
    pub start: Timestamp,
    pub end: Timestamp,
    pub notes: Option<String>,
    pub location: Option<String>,
}

pub struct CreateBookingHandler {
    bookings: Arc<dyn BookingRepository>,
    clients: Arc<dyn ClientRepository>,
    trainers: Arc<dyn TrainerRepository>,
    gate: EntitlementGate,
    publisher: Arc<dyn EventPublisher>,
}

impl CreateBookingHandler {
    pub fn new(
        bookings: Arc<dyn BookingRepository>,
        clients: Arc<dyn ClientRepository>,
        trainers: Arc<dyn TrainerRepository>,
        gate: EntitlementGate,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            bookings,
            clients,
            trainers,
            gate,
            publisher,
        }
    }

    pub async fn handle(&self, ctx: &TenantContext, cmd: CreateBookingCommand) -> Result<Booking, DomainError> {
        self.gate.ensure_writable(ctx).await?;

        let client = self
            .clients
            .find(ctx.trainer_id, cmd.client_id)
            .await?
            .ok_or_else(|| DomainError::validation("client", "Client not found for this trainer"))?;
        if !client.is_active {
            return Err(DomainError::validation("client", "Client is not active"));
        }
        let trainer = self
            .trainers
            .find_by_id(ctx.trainer_id)
            .await?
            .ok_or_else(|| DomainError::not_found("trainer"))?;

        let now = Timestamp::now();
        let booking = Booking::schedule(
            ctx.trainer_id,
            client.id,
            cmd.start,
            cmd.end,
            cmd.notes,
            cmd.location,
            now,
        )?;

        if let BookingWrite::Conflict(existing) = self.bookings.insert_checked(&booking).await? {
            return Err(booking_conflict(existing));
        }

        tracing::info!(booking_id = %booking.id, trainer_id = %ctx.trainer_id, "booking created");
        publish_after_commit(
            self.publisher.as_ref(),
            vec![TenantEvent::for_booking(EventKind::BookingCreated, &booking, &client, &trainer, now)],
        )
        .await;
        Ok(booking)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::test_support::{trainer_account, Fixture};
    use crate::domain::entitlement::Plan;
    use crate::domain::foundation::{ErrorCode, ErrorKind};

    fn handler(fx: &Fixture) -> CreateBookingHandler {
        CreateBookingHandler::new(
            Arc::new(fx.store.clone()),
            Arc::new(fx.store.clone()),
            Arc::new(fx.store.clone()),
            fx.gate(),
            fx.bus.clone(),
        )
    }

    fn command(client_id: ClientId, start: Timestamp, minutes: i64) -> CreateBookingCommand {
        CreateBookingCommand {
            client_id,
            start,
            end: start.plus_minutes(minutes),
            notes: None,
            location: Some("Gym".into()),
        }
    }

    #[tokio::test]
    async fn overlapping_create_is_rejected_and_publishes_once() {
        let fx = Fixture::new(Plan::Free).await;
        let client = fx.client("Dana", "dana@example.com").await;
        let handler = handler(&fx);
        let start = Timestamp::now().add_days(2);

        handler.handle(&fx.ctx, command(client.id, start, 60)).await.unwrap();
        let err = handler
            .handle(&fx.ctx, command(client.id, start.plus_minutes(30), 60))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::BookingConflict);

        // Back-to-back is fine.
        handler.handle(&fx.ctx, command(client.id, start.plus_minutes(60), 60)).await.unwrap();

        let events = fx.bus.events_of_type("booking_created");
        assert_eq!(events.len(), 2);
        let event: TenantEvent = events[0].payload_as().unwrap();
        assert_eq!(event.schedule_reference, Some(start));
    }

    #[tokio::test]
    async fn past_starts_and_foreign_clients_are_rejected() {
        let fx = Fixture::new(Plan::Free).await;
        let client = fx.client("Dana", "dana@example.com").await;
        let handler = handler(&fx);

        let err = handler
            .handle(&fx.ctx, command(client.id, Timestamp::now().plus_minutes(-60), 30))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let (_, other) = trainer_account(&fx.store, "other@example.com", Plan::Free).await;
        let err = handler
            .handle(&other, command(client.id, Timestamp::now().add_days(1), 30))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
}
