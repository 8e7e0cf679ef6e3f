//! AvailableSlotsHandler - free start times for a trainer over a date window.
//!
//! Candidates come from active weekly rules minus days blocked by breaks,
//! evaluated as civil times in the trainer's zone. Candidates that collide
//! with a held booking are then removed.

use chrono::NaiveDate;
use std::sync::Arc;

use crate::domain::foundation::{DomainError, TrainerId};
use crate::domain::scheduling::{candidate_slots, remove_conflicts, SlotMap, SlotWindow};
use crate::ports::{AvailabilityRepository, BookingRepository, TrainerRepository};

pub struct AvailableSlotsHandler {
    trainers: Arc<dyn TrainerRepository>,
    availability: Arc<dyn AvailabilityRepository>,
    bookings: Arc<dyn BookingRepository>,
}

impl AvailableSlotsHandler {
    pub fn new(
        trainers: Arc<dyn TrainerRepository>,
        availability: Arc<dyn AvailabilityRepository>,
        bookings: Arc<dyn BookingRepository>,
    ) -> Self {
        Self {
            trainers,
            availability,
            bookings,
        }
    }

    pub async fn handle(
        &self,
        trainer_id: TrainerId,
        from: NaiveDate,
        to: NaiveDate,
        duration_minutes: u32,
    ) -> Result<SlotMap, DomainError> {
        let window = SlotWindow::new(from, to, duration_minutes)?;
        let trainer = self
            .trainers
            .find_by_id(trainer_id)
            .await?
            .ok_or_else(|| DomainError::not_found("trainer"))?;
        let tz = trainer.timezone;
        let (lower, upper) = window.instant_bounds(tz);

        let rules = self.availability.list_rules(trainer_id).await?;
        let breaks = self.availability.list_breaks_between(trainer_id, lower, upper).await?;
        let candidates = candidate_slots(&rules, &breaks, tz, &window);

        let held: Vec<_> = self
            .bookings
            .list_held_between(trainer_id, lower, upper)
            .await?
            .into_iter()
            .map(|b| (b.start, b.end))
            .collect();

        Ok(remove_conflicts(candidates, tz, duration_minutes, &held))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::test_support::Fixture;
    use crate::domain::entitlement::Plan;
    use crate::domain::foundation::{ErrorKind, Timestamp};
    use crate::domain::scheduling::{slot_instant, AvailabilityRule, Booking, BreakPeriod};
    use chrono::{Datelike, Duration, NaiveTime};

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    /// Next Monday at least a week out, so bookings are in the future.
    fn next_monday() -> NaiveDate {
        let mut date = Timestamp::now().date_utc() + Duration::days(7);
        while date.weekday() != chrono::Weekday::Mon {
            date += Duration::days(1);
        }
        date
    }

    async fn setup() -> (Fixture, AvailableSlotsHandler) {
        let fx = Fixture::new(Plan::Free).await;
        let rule = AvailabilityRule::new(fx.ctx.trainer_id, 0, time(9, 0), time(12, 0), Timestamp::now()).unwrap();
        AvailabilityRepository::save_rule(&fx.store, &rule).await.unwrap();
        let handler = AvailableSlotsHandler::new(
            Arc::new(fx.store.clone()),
            Arc::new(fx.store.clone()),
            Arc::new(fx.store.clone()),
        );
        (fx, handler)
    }

    #[tokio::test]
    async fn held_bookings_remove_overlapping_slots() {
        let (fx, handler) = setup().await;
        let monday = next_monday();
        let client = fx.client("Client", "client@example.com").await;
        let start = slot_instant(fx.ctx.timezone, monday, time(10, 0)).unwrap();
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
        BookingRepository::insert_checked(&fx.store, &booking).await.unwrap();

        let slots = handler.handle(fx.ctx.trainer_id, monday, monday, 60).await.unwrap();
        assert_eq!(slots.get(&monday).unwrap(), &vec![time(9, 0), time(11, 0)]);
    }

    #[tokio::test]
    async fn breaks_block_whole_days_and_empty_days_are_omitted() {
        let (fx, handler) = setup().await;
        let monday = next_monday();
        let start = slot_instant(fx.ctx.timezone, monday, time(15, 0)).unwrap();
        let period = BreakPeriod::new(fx.ctx.trainer_id, start, start.plus_minutes(30), None, Timestamp::now()).unwrap();
        AvailabilityRepository::insert_break(&fx.store, &period).await.unwrap();

        let slots = handler
            .handle(fx.ctx.trainer_id, monday, monday + Duration::days(7), 60)
            .await
            .unwrap();
        assert_eq!(slots.len(), 1);
        assert!(slots.contains_key(&(monday + Duration::days(7))));
    }

    #[tokio::test]
    async fn window_limits_are_validated() {
        let (fx, handler) = setup().await;
        let monday = next_monday();
        let err = handler
            .handle(fx.ctx.trainer_id, monday, monday + Duration::days(120), 60)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        let err = handler.handle(fx.ctx.trainer_id, monday, monday, 2).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
}
