use async_trait::async_trait;

use super::state::MemoryState;
use super::InMemoryStore;
use crate::domain::foundation::{
    AvailabilityRuleId, BookingId, BreakId, DomainError, Page, PageRequest, Timestamp, TrainerId,
};
use crate::domain::scheduling::{AvailabilityRule, Booking, BookingStatus, BreakPeriod};
use crate::ports::{AvailabilityRepository, BookingFilter, BookingRepository, BookingWrite};

#[async_trait]
impl AvailabilityRepository for InMemoryStore {
    async fn list_rules(&self, trainer_id: TrainerId) -> Result<Vec<AvailabilityRule>, DomainError> {
        let state = self.read().await;
        let mut rules: Vec<AvailabilityRule> = state
            .rules
            .values()
            .filter(|r| r.trainer_id == trainer_id)
            .cloned()
            .collect();
        rules.sort_by_key(|r| (r.day_of_week, r.start_time));
        Ok(rules)
    }

    async fn find_rule(&self, trainer_id: TrainerId, id: AvailabilityRuleId) -> Result<Option<AvailabilityRule>, DomainError> {
        Ok(self
            .read()
            .await
            .rules
            .get(&id)
            .filter(|r| r.trainer_id == trainer_id)
            .cloned())
    }

    async fn save_rule(&self, rule: &AvailabilityRule) -> Result<(), DomainError> {
        let mut state = self.write().await;
        let duplicate = state.rules.values().any(|r| {
            r.id != rule.id
                && r.trainer_id == rule.trainer_id
                && r.day_of_week == rule.day_of_week
                && r.start_time == rule.start_time
                && r.end_time == rule.end_time
        });
        if duplicate {
            return Err(DomainError::conflict("An identical availability rule already exists"));
        }
        state.rules.insert(rule.id, rule.clone());
        Ok(())
    }

    async fn delete_rule(&self, trainer_id: TrainerId, id: AvailabilityRuleId) -> Result<bool, DomainError> {
        let mut state = self.write().await;
        if state.rules.get(&id).map_or(false, |r| r.trainer_id == trainer_id) {
            state.rules.remove(&id);
            return Ok(true);
        }
        Ok(false)
    }

    async fn list_breaks(&self, trainer_id: TrainerId) -> Result<Vec<BreakPeriod>, DomainError> {
        let state = self.read().await;
        let mut breaks: Vec<BreakPeriod> = state
            .breaks
            .values()
            .filter(|b| b.trainer_id == trainer_id)
            .cloned()
            .collect();
        breaks.sort_by_key(|b| b.start);
        Ok(breaks)
    }

    async fn list_breaks_between(&self, trainer_id: TrainerId, from: Timestamp, to: Timestamp) -> Result<Vec<BreakPeriod>, DomainError> {
        Ok(self
            .list_breaks(trainer_id)
            .await?
            .into_iter()
            .filter(|b| b.start.is_before(&to) && b.end.is_after(&from))
            .collect())
    }

    async fn insert_break(&self, period: &BreakPeriod) -> Result<(), DomainError> {
        self.write().await.breaks.insert(period.id, period.clone());
        Ok(())
    }

    async fn delete_break(&self, trainer_id: TrainerId, id: BreakId) -> Result<bool, DomainError> {
        let mut state = self.write().await;
        if state.breaks.get(&id).map_or(false, |b| b.trainer_id == trainer_id) {
            state.breaks.remove(&id);
            return Ok(true);
        }
        Ok(false)
    }
}

impl MemoryState {
    fn held_conflict(&self, booking: &Booking) -> Option<BookingId> {
        let mut clashes: Vec<&Booking> = self
            .bookings
            .values()
            .filter(|b| {
                b.id != booking.id
                    && b.trainer_id == booking.trainer_id
                    && b.status.is_held()
                    && b.overlaps(&booking.start, &booking.end)
            })
            .collect();
        clashes.sort_by_key(|b| b.start);
        clashes.first().map(|b| b.id)
    }
}

#[async_trait]
impl BookingRepository for InMemoryStore {
    async fn insert_checked(&self, booking: &Booking) -> Result<BookingWrite, DomainError> {
        let mut state = self.write().await;
        if booking.status.is_held() {
            if let Some(existing) = state.held_conflict(booking) {
                return Ok(BookingWrite::Conflict(existing));
            }
        }
        state.bookings.insert(booking.id, booking.clone());
        Ok(BookingWrite::Written)
    }

    async fn update(&self, booking: &Booking, check_overlap: bool) -> Result<BookingWrite, DomainError> {
        let mut state = self.write().await;
        if !state.bookings.contains_key(&booking.id) {
            return Err(DomainError::not_found("Booking"));
        }
        if check_overlap && booking.status.is_held() {
            if let Some(existing) = state.held_conflict(booking) {
                return Ok(BookingWrite::Conflict(existing));
            }
        }
        state.bookings.insert(booking.id, booking.clone());
        Ok(BookingWrite::Written)
    }

    async fn find(&self, trainer_id: TrainerId, id: BookingId) -> Result<Option<Booking>, DomainError> {
        Ok(self
            .read()
            .await
            .bookings
            .get(&id)
            .filter(|b| b.trainer_id == trainer_id)
            .cloned())
    }

    async fn find_by_id(&self, id: BookingId) -> Result<Option<Booking>, DomainError> {
        Ok(self.read().await.bookings.get(&id).cloned())
    }

    async fn list(&self, trainer_id: TrainerId, filter: &BookingFilter, page: PageRequest) -> Result<Page<Booking>, DomainError> {
        let state = self.read().await;
        let mut bookings: Vec<Booking> = state
            .bookings
            .values()
            .filter(|b| b.trainer_id == trainer_id && filter.matches(b))
            .cloned()
            .collect();
        bookings.sort_by(|a, b| b.start.cmp(&a.start));
        Ok(Page::new(page.slice(&bookings), bookings.len() as u64, page))
    }

    async fn list_held_between(&self, trainer_id: TrainerId, from: Timestamp, to: Timestamp) -> Result<Vec<Booking>, DomainError> {
        let state = self.read().await;
        let mut bookings: Vec<Booking> = state
            .bookings
            .values()
            .filter(|b| b.trainer_id == trainer_id && b.status.is_held() && b.overlaps(&from, &to))
            .cloned()
            .collect();
        bookings.sort_by_key(|b| b.start);
        Ok(bookings)
    }

    async fn list_due_for_reminder(&self, from: Timestamp, to: Timestamp, limit: u32) -> Result<Vec<Booking>, DomainError> {
        let state = self.read().await;
        let mut bookings: Vec<Booking> = state
            .bookings
            .values()
            .filter(|b| {
                b.status == BookingStatus::Confirmed
                    && b.reminder_sent_at.is_none()
                    && !b.start.is_before(&from)
                    && b.start.is_before(&to)
            })
            .cloned()
            .collect();
        bookings.sort_by_key(|b| b.start);
        bookings.truncate(limit as usize);
        Ok(bookings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::ClientId;

    fn booking(trainer: TrainerId, start_min: i64, end_min: i64) -> Booking {
        let now = Timestamp::now();
        Booking::schedule(
            trainer,
            ClientId::new(),
            now.plus_minutes(start_min),
            now.plus_minutes(end_min),
            None,
            None,
            now,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn held_bookings_cannot_overlap() {
        let store = InMemoryStore::new();
        let trainer = TrainerId::new();
        let first = booking(trainer, 60, 120);
        assert_eq!(store.insert_checked(&first).await.unwrap(), BookingWrite::Written);

        let clash = booking(trainer, 90, 150);
        assert_eq!(store.insert_checked(&clash).await.unwrap(), BookingWrite::Conflict(first.id));

        let adjacent = booking(trainer, 120, 180);
        assert_eq!(store.insert_checked(&adjacent).await.unwrap(), BookingWrite::Written);

        let other_trainer = booking(TrainerId::new(), 60, 120);
        assert_eq!(store.insert_checked(&other_trainer).await.unwrap(), BookingWrite::Written);
    }

    #[tokio::test]
    async fn cancelled_bookings_free_the_slot() {
        let store = InMemoryStore::new();
        let trainer = TrainerId::new();
        let mut first = booking(trainer, 60, 120);
        store.insert_checked(&first).await.unwrap();
        first.cancel(None, Timestamp::now()).unwrap();
        store.update(&first, false).await.unwrap();

        let again = booking(trainer, 60, 120);
        assert_eq!(store.insert_checked(&again).await.unwrap(), BookingWrite::Written);
    }
}
