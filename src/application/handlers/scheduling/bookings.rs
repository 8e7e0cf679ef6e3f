//! Booking reads and rescheduling.

use std::sync::Arc;

use super::booking_conflict;
use crate::application::handlers::entitlement::EntitlementGate;
use crate::domain::foundation::{BookingId, DomainError, Page, PageRequest, Timestamp};
use crate::domain::identity::TenantContext;
use crate::domain::scheduling::Booking;
use crate::ports::{BookingFilter, BookingRepository, BookingWrite};

/// New times plus optional notes/location; `None` leaves a field unchanged.
#[derive(Debug, Clone)]
pub struct RescheduleBookingCommand {
    pub start: Option<Timestamp>,
    pub end: Option<Timestamp>,
    pub notes: Option<String>,
    pub location: Option<String>,
}

pub struct RescheduleBookingHandler {
    bookings: Arc<dyn BookingRepository>,
    gate: EntitlementGate,
}

impl RescheduleBookingHandler {
    pub fn new(bookings: Arc<dyn BookingRepository>, gate: EntitlementGate) -> Self {
        Self { bookings, gate }
    }

    pub async fn handle(
        &self,
        ctx: &TenantContext,
        id: BookingId,
        cmd: RescheduleBookingCommand,
    ) -> Result<Booking, DomainError> {
        self.gate.ensure_writable(ctx).await?;
        let mut booking = self
            .bookings
            .find(ctx.trainer_id, id)
            .await?
            .ok_or_else(|| DomainError::not_found("booking"))?;

        let now = Timestamp::now();
        let start = cmd.start.unwrap_or(booking.start);
        let end = cmd.end.unwrap_or(booking.end);
        booking.reschedule(start, end, now)?;
        if let Some(notes) = cmd.notes {
            booking.notes = notes;
        }
        if let Some(location) = cmd.location {
            booking.location = Some(location).filter(|l| !l.trim().is_empty());
        }

        if let BookingWrite::Conflict(existing) = self.bookings.update(&booking, true).await? {
            return Err(booking_conflict(existing));
        }
        Ok(booking)
    }
}

pub struct ListBookingsHandler {
    bookings: Arc<dyn BookingRepository>,
}

impl ListBookingsHandler {
    pub fn new(bookings: Arc<dyn BookingRepository>) -> Self {
        Self { bookings }
    }

    /// Newest start first.
    pub async fn list(
        &self,
        ctx: &TenantContext,
        filter: &BookingFilter,
        page: PageRequest,
    ) -> Result<Page<Booking>, DomainError> {
        self.bookings.list(ctx.trainer_id, filter, page).await
    }

    pub async fn get(&self, ctx: &TenantContext, id: BookingId) -> Result<Booking, DomainError> {
        self.bookings
            .find(ctx.trainer_id, id)
            .await?
            .ok_or_else(|| DomainError::not_found("booking"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::test_support::Fixture;
    use crate::domain::entitlement::Plan;
    use crate::domain::foundation::ErrorCode;
    use crate::domain::scheduling::BookingStatus;
    use crate::ports::BookingWindow;

    async fn seed(fx: &Fixture, offsets_hours: &[i64]) -> Vec<Booking> {
        let client = fx.client("Lee", "lee@example.com").await;
        let base = Timestamp::now().add_days(1);
        let mut out = Vec::new();
        for h in offsets_hours {
            let start = base.plus_minutes(h * 60);
            let b = Booking::schedule(fx.ctx.trainer_id, client.id, start, start.plus_minutes(60), None, None, Timestamp::now())
                .unwrap();
            fx.store.insert_checked(&b).await.unwrap();
            out.push(b);
        }
        out
    }

    #[tokio::test]
    async fn reschedule_rechecks_overlap_excluding_itself() {
        let fx = Fixture::new(Plan::Free).await;
        let seeded = seed(&fx, &[0, 3]).await;
        let handler = RescheduleBookingHandler::new(Arc::new(fx.store.clone()), fx.gate());

        // Shifting within its own interval is fine.
        let moved = handler
            .handle(
                &fx.ctx,
                seeded[0].id,
                RescheduleBookingCommand {
                    start: Some(seeded[0].start.plus_minutes(30)),
                    end: Some(seeded[0].end.plus_minutes(30)),
                    notes: Some("moved".into()),
                    location: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(moved.notes, "moved");

        let err = handler
            .handle(
                &fx.ctx,
                seeded[0].id,
                RescheduleBookingCommand {
                    start: Some(seeded[1].start),
                    end: Some(seeded[1].end),
                    notes: None,
                    location: None,
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::BookingConflict);
    }

    #[tokio::test]
    async fn listing_is_newest_first_and_filterable() {
        let fx = Fixture::new(Plan::Free).await;
        let seeded = seed(&fx, &[0, 2, 4]).await;
        let handler = ListBookingsHandler::new(Arc::new(fx.store.clone()));

        let page = handler
            .list(&fx.ctx, &BookingFilter::default(), PageRequest::new(None, Some(2)))
            .await
            .unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].id, seeded[2].id);

        let upcoming = BookingFilter {
            window: BookingWindow::Upcoming(Timestamp::now()),
            status: Some(BookingStatus::Pending),
            ..Default::default()
        };
        assert_eq!(handler.list(&fx.ctx, &upcoming, PageRequest::default()).await.unwrap().total, 3);

        let past = BookingFilter {
            window: BookingWindow::Past(Timestamp::now()),
            ..Default::default()
        };
        assert_eq!(handler.list(&fx.ctx, &past, PageRequest::default()).await.unwrap().total, 0);
    }
}
