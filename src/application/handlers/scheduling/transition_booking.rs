//! TransitionBookingHandler - confirm, cancel, complete and no-show.

use std::sync::Arc;

use super::booking_conflict;
use crate::application::events::publish_after_commit;
use crate::application::handlers::entitlement::EntitlementGate;
use crate::domain::foundation::{BookingId, DomainError, Timestamp};
use crate::domain::identity::TenantContext;
use crate::domain::scheduling::Booking;
use crate::domain::workflow::{EventKind, TenantEvent};
use crate::ports::{
    enqueue_now, BookingRepository, BookingWrite, ClientRepository, EventPublisher, JobKind, JobQueue,
    TrainerRepository,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingTransition {
    Confirm,
    Cancel { reason: Option<String> },
    Complete,
    NoShow,
}

impl BookingTransition {
    fn event_kind(&self) -> Option<EventKind> {
        match self {
            BookingTransition::Confirm => Some(EventKind::BookingConfirmed),
            BookingTransition::Cancel { .. } => Some(EventKind::BookingCancelled),
            BookingTransition::Complete => Some(EventKind::BookingCompleted),
            BookingTransition::NoShow => None,
        }
    }
}

pub struct TransitionBookingHandler {
    bookings: Arc<dyn BookingRepository>,
    clients: Arc<dyn ClientRepository>,
    trainers: Arc<dyn TrainerRepository>,
    jobs: Arc<dyn JobQueue>,
    gate: EntitlementGate,
    publisher: Arc<dyn EventPublisher>,
}

impl TransitionBookingHandler {
    pub fn new(
        bookings: Arc<dyn BookingRepository>,
        clients: Arc<dyn ClientRepository>,
        trainers: Arc<dyn TrainerRepository>,
        jobs: Arc<dyn JobQueue>,
        gate: EntitlementGate,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            bookings,
            clients,
            trainers,
            jobs,
            gate,
            publisher,
        }
    }

    pub async fn handle(
        &self,
        ctx: &TenantContext,
        id: BookingId,
        transition: BookingTransition,
    ) -> Result<Booking, DomainError> {
        self.gate.ensure_writable(ctx).await?;
        let mut booking = self
            .bookings
            .find(ctx.trainer_id, id)
            .await?
            .ok_or_else(|| DomainError::not_found("booking"))?;

        let now = Timestamp::now();
        match &transition {
            BookingTransition::Confirm => booking.confirm(now)?,
            BookingTransition::Cancel { reason } => booking.cancel(reason.clone(), now)?,
            BookingTransition::Complete => booking.complete(now)?,
            BookingTransition::NoShow => booking.mark_no_show(now)?,
        }

        // Only moves into a held status can create an overlap.
        let check_overlap = booking.status.is_held();
        if let BookingWrite::Conflict(existing) = self.bookings.update(&booking, check_overlap).await? {
            return Err(booking_conflict(existing));
        }

        if transition == BookingTransition::Confirm {
            if let Err(e) = enqueue_now(
                self.jobs.as_ref(),
                JobKind::SendBookingConfirmation { booking_id: booking.id },
            )
            .await
            {
                tracing::warn!(booking_id = %booking.id, error = %e, "failed to enqueue booking confirmation");
            }
        }

        if let Some(kind) = transition.event_kind() {
            let client = self.clients.find(ctx.trainer_id, booking.client_id).await?;
            let trainer = self.trainers.find_by_id(ctx.trainer_id).await?;
            if let (Some(client), Some(trainer)) = (client, trainer) {
                publish_after_commit(
                    self.publisher.as_ref(),
                    vec![TenantEvent::for_booking(kind, &booking, &client, &trainer, now)],
                )
                .await;
            }
        }

        Ok(booking)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::test_support::Fixture;
    use crate::domain::entitlement::Plan;
    use crate::domain::foundation::ErrorCode;
    use crate::domain::scheduling::BookingStatus;

    async fn booking(fx: &Fixture, start: Timestamp) -> Booking {
        let client = fx.client("Robin", &format!("robin-{}@example.com", start.as_unix_secs())).await;
        let booking = Booking::schedule(
            fx.ctx.trainer_id,
            client.id,
            start,
            start.plus_minutes(60),
            None,
            None,
            Timestamp::now(),
        )
        .unwrap();
        fx.store.insert_checked(&booking).await.unwrap();
        booking
    }

    fn handler(fx: &Fixture) -> TransitionBookingHandler {
        TransitionBookingHandler::new(
            Arc::new(fx.store.clone()),
            Arc::new(fx.store.clone()),
            Arc::new(fx.store.clone()),
            Arc::new(fx.store.clone()),
            fx.gate(),
            fx.bus.clone(),
        )
    }

    #[tokio::test]
    async fn confirm_enqueues_confirmation_and_publishes() {
        let fx = Fixture::new(Plan::Free).await;
        let b = booking(&fx, Timestamp::now().add_days(1)).await;

        let confirmed = handler(&fx).handle(&fx.ctx, b.id, BookingTransition::Confirm).await.unwrap();
        assert_eq!(confirmed.status, BookingStatus::Confirmed);

        let jobs = fx.store.pending_jobs().await;
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].kind, JobKind::SendBookingConfirmation { booking_id: b.id });
        assert_eq!(fx.bus.events_of_type("booking_confirmed").len(), 1);
    }

    #[tokio::test]
    async fn terminal_bookings_reject_transitions() {
        let fx = Fixture::new(Plan::Free).await;
        let b = booking(&fx, Timestamp::now().add_days(1)).await;
        let handler = handler(&fx);

        let cancelled = handler
            .handle(&fx.ctx, b.id, BookingTransition::Cancel { reason: Some("Sick".into()) })
            .await
            .unwrap();
        assert_eq!(cancelled.cancellation_reason.as_deref(), Some("Sick"));

        let err = handler.handle(&fx.ctx, b.id, BookingTransition::Confirm).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidStateTransition);
        assert_eq!(fx.bus.events_of_type("booking_cancelled").len(), 1);
    }

    #[tokio::test]
    async fn no_show_requires_the_session_to_have_ended() {
        let fx = Fixture::new(Plan::Free).await;
        let b = booking(&fx, Timestamp::now().add_days(1)).await;
        let handler = handler(&fx);
        handler.handle(&fx.ctx, b.id, BookingTransition::Confirm).await.unwrap();

        let err = handler.handle(&fx.ctx, b.id, BookingTransition::NoShow).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidStateTransition);
    }
}
