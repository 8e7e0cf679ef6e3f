//! Scheduling ports - availability rules, breaks and bookings.

use async_trait::async_trait;

use crate::domain::foundation::{
    AvailabilityRuleId, BookingId, BreakId, ClientId, DomainError, Page, PageRequest, Timestamp,
    TrainerId,
};
use crate::domain::scheduling::{AvailabilityRule, Booking, BookingStatus, BreakPeriod};

#[async_trait]
pub trait AvailabilityRepository: Send + Sync {
    async fn list_rules(&self, trainer_id: TrainerId) -> Result<Vec<AvailabilityRule>, DomainError>;

    async fn find_rule(&self, trainer_id: TrainerId, id: AvailabilityRuleId) -> Result<Option<AvailabilityRule>, DomainError>;

    /// # Errors
    ///
    /// - `Conflict` if the trainer already has a rule with the same day and times
    async fn save_rule(&self, rule: &AvailabilityRule) -> Result<(), DomainError>;

    /// Returns whether a rule was deleted.
    async fn delete_rule(&self, trainer_id: TrainerId, id: AvailabilityRuleId) -> Result<bool, DomainError>;

    async fn list_breaks(&self, trainer_id: TrainerId) -> Result<Vec<BreakPeriod>, DomainError>;

    /// Breaks intersecting `[from, to)`.
    async fn list_breaks_between(
        &self,
        trainer_id: TrainerId,
        from: Timestamp,
        to: Timestamp,
    ) -> Result<Vec<BreakPeriod>, DomainError>;

    async fn insert_break(&self, period: &BreakPeriod) -> Result<(), DomainError>;

    async fn delete_break(&self, trainer_id: TrainerId, id: BreakId) -> Result<bool, DomainError>;
}

/// Time-based view over bookings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingWindow {
    All,
    /// Held bookings starting at or after the instant.
    Upcoming(Timestamp),
    /// Bookings that ended before the instant.
    Past(Timestamp),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookingFilter {
    pub status: Option<BookingStatus>,
    pub client_id: Option<ClientId>,
    pub from: Option<Timestamp>,
    pub to: Option<Timestamp>,
    pub window: BookingWindow,
}

impl Default for BookingFilter {
    fn default() -> Self {
        Self {
            status: None,
            client_id: None,
            from: None,
            to: None,
            window: BookingWindow::All,
        }
    }
}

impl BookingFilter {
    pub fn matches(&self, booking: &Booking) -> bool {
        self.status.map_or(true, |s| booking.status == s)
            && self.client_id.map_or(true, |c| booking.client_id == c)
            && self.from.map_or(true, |f| !booking.start.is_before(&f))
            && self.to.map_or(true, |t| booking.start.is_before(&t))
            && match self.window {
                BookingWindow::All => true,
                BookingWindow::Upcoming(now) => booking.status.is_held() && !booking.start.is_before(&now),
                BookingWindow::Past(now) => booking.end.is_before(&now),
            }
    }
}

/// Outcome of a booking write that must keep held bookings disjoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingWrite {
    Written,
    /// Nothing was written; the first held booking in the way.
    Conflict(BookingId),
}

#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Inserts after checking for held overlaps, serialized per trainer.
    async fn insert_checked(&self, booking: &Booking) -> Result<BookingWrite, DomainError>;

    /// Updates a booking. When `check_overlap` is set and the booking is
    /// held, other held bookings must not overlap it.
    async fn update(&self, booking: &Booking, check_overlap: bool) -> Result<BookingWrite, DomainError>;

    async fn find(&self, trainer_id: TrainerId, id: BookingId) -> Result<Option<Booking>, DomainError>;

    /// Unscoped lookup for background jobs.
    async fn find_by_id(&self, id: BookingId) -> Result<Option<Booking>, DomainError>;

    /// Newest start first.
    async fn list(&self, trainer_id: TrainerId, filter: &BookingFilter, page: PageRequest) -> Result<Page<Booking>, DomainError>;

    /// Held bookings intersecting `[from, to)`.
    async fn list_held_between(&self, trainer_id: TrainerId, from: Timestamp, to: Timestamp) -> Result<Vec<Booking>, DomainError>;

    /// Confirmed bookings starting in `[from, to)` that have not been reminded.
    async fn list_due_for_reminder(&self, from: Timestamp, to: Timestamp, limit: u32) -> Result<Vec<Booking>, DomainError>;
}
