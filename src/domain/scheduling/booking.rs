//! Booking aggregate and its lifecycle.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{
    BookingId, ClientId, DomainError, ErrorCode, StateMachine, Timestamp, TrainerId,
    ValidationError,
};

/// Booking lifecycle status.
///
/// ```text
/// pending ──confirm──▶ confirmed ──complete──▶ completed
///    │                     │  └──no_show──▶ no_show
///    └──cancel──▶ cancelled ◀──cancel──┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
    NoShow,
}

impl BookingStatus {
    pub const ALL: [BookingStatus; 5] = [
        BookingStatus::Pending,
        BookingStatus::Confirmed,
        BookingStatus::Completed,
        BookingStatus::Cancelled,
        BookingStatus::NoShow,
    ];

    /// Held bookings occupy the trainer's time.
    pub fn is_held(&self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::Confirmed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::NoShow => "no_show",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BookingStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| {
                ValidationError::invalid_format("status", format!("unknown booking status '{}'", s))
            })
    }
}

impl StateMachine for BookingStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use BookingStatus::*;
        matches!(
            (self, target),
            (Pending, Confirmed)
                | (Pending, Cancelled)
                | (Confirmed, Completed)
                | (Confirmed, Cancelled)
                | (Confirmed, NoShow)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use BookingStatus::*;
        match self {
            Pending => vec![Confirmed, Cancelled],
            Confirmed => vec![Completed, Cancelled, NoShow],
            Completed | Cancelled | NoShow => vec![],
        }
    }
}

/// A scheduled session between a trainer and one of their clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub trainer_id: TrainerId,
    pub client_id: ClientId,
    pub start: Timestamp,
    pub end: Timestamp,
    pub status: BookingStatus,
    pub notes: String,
    pub cancellation_reason: Option<String>,
    pub location: Option<String>,
    pub reminder_sent_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Booking {
    /// Creates a pending booking. The start must not be in the past.
    pub fn schedule(
        trainer_id: TrainerId,
        client_id: ClientId,
        start: Timestamp,
        end: Timestamp,
        notes: Option<String>,
        location: Option<String>,
        now: Timestamp,
    ) -> Result<Self, DomainError> {
        validate_interval(start, end)?;
        if start.is_before(&now) {
            return Err(DomainError::validation(
                "start",
                "Cannot create a booking in the past",
            ));
        }
        Ok(Self {
            id: BookingId::new(),
            trainer_id,
            client_id,
            start,
            end,
            status: BookingStatus::Pending,
            notes: notes.unwrap_or_default(),
            cancellation_reason: None,
            location: location.filter(|l| !l.trim().is_empty()),
            reminder_sent_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn duration_minutes(&self) -> i64 {
        self.end.duration_since(&self.start).num_minutes()
    }

    /// Half-open overlap with `[start, end)`.
    pub fn overlaps(&self, start: &Timestamp, end: &Timestamp) -> bool {
        self.start.is_before(end) && self.end.is_after(start)
    }

    pub fn confirm(&mut self, now: Timestamp) -> Result<(), DomainError> {
        self.transition(BookingStatus::Confirmed, now)
    }

    pub fn cancel(&mut self, reason: Option<String>, now: Timestamp) -> Result<(), DomainError> {
        self.transition(BookingStatus::Cancelled, now)?;
        self.cancellation_reason = reason.filter(|r| !r.trim().is_empty());
        Ok(())
    }

    pub fn complete(&mut self, now: Timestamp) -> Result<(), DomainError> {
        self.transition(BookingStatus::Completed, now)
    }

    /// A no-show can only be recorded once the session has ended.
    pub fn mark_no_show(&mut self, now: Timestamp) -> Result<(), DomainError> {
        if self.status == BookingStatus::Confirmed && !self.end.is_before(&now) {
            return Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                "Cannot mark a booking as no-show before it has ended",
            )
            .with_detail("from", self.status.as_str())
            .with_detail("to", BookingStatus::NoShow.as_str()));
        }
        self.transition(BookingStatus::NoShow, now)
    }

    /// Moves the booking to new times. Past times are allowed for existing bookings.
    pub fn reschedule(&mut self, start: Timestamp, end: Timestamp, now: Timestamp) -> Result<(), DomainError> {
        if self.status.is_terminal() {
            return Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                format!("Cannot reschedule a {} booking", self.status),
            ));
        }
        validate_interval(start, end)?;
        self.start = start;
        self.end = end;
        self.updated_at = now;
        Ok(())
    }

    /// Sets the status without lifecycle checks (workflow `update_status`).
    pub fn force_status(&mut self, status: BookingStatus, now: Timestamp) {
        self.status = status;
        self.updated_at = now;
    }

    pub fn append_note(&mut self, paragraph: &str, now: Timestamp) {
        append_paragraph(&mut self.notes, paragraph);
        self.updated_at = now;
    }

    fn transition(&mut self, target: BookingStatus, now: Timestamp) -> Result<(), DomainError> {
        self.status = self.status.transition_to(target).map_err(|_| {
            DomainError::new(
                ErrorCode::InvalidStateTransition,
                format!("Cannot change a {} booking to {}", self.status, target),
            )
            .with_detail("from", self.status.as_str())
            .with_detail("to", target.as_str())
        })?;
        self.updated_at = now;
        Ok(())
    }
}

fn validate_interval(start: Timestamp, end: Timestamp) -> Result<(), DomainError> {
    if !start.is_before(&end) {
        return Err(DomainError::validation("end", "End time must be after start time"));
    }
    Ok(())
}

/// Appends a paragraph, separated from existing text by a blank line.
pub fn append_paragraph(notes: &mut String, paragraph: &str) {
    if !notes.trim().is_empty() {
        notes.push_str("\n\n");
    }
    notes.push_str(paragraph);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending_booking(now: Timestamp) -> Booking {
        Booking::schedule(
            TrainerId::new(),
            ClientId::new(),
            now.plus_minutes(60),
            now.plus_minutes(120),
            None,
            None,
            now,
        )
        .unwrap()
    }

    #[test]
    fn new_bookings_are_pending_and_held() {
        let b = pending_booking(Timestamp::now());
        assert_eq!(b.status, BookingStatus::Pending);
        assert!(b.status.is_held());
        assert_eq!(b.duration_minutes(), 60);
    }

    #[test]
    fn rejects_past_start_and_inverted_interval() {
        let now = Timestamp::now();
        let past = Booking::schedule(
            TrainerId::new(),
            ClientId::new(),
            now.plus_minutes(-60),
            now.plus_minutes(-30),
            None,
            None,
            now,
        );
        assert_eq!(past.unwrap_err().code, ErrorCode::ValidationFailed);

        let inverted = Booking::schedule(
            TrainerId::new(),
            ClientId::new(),
            now.plus_minutes(60),
            now.plus_minutes(30),
            None,
            None,
            now,
        );
        assert!(inverted.is_err());
    }

    #[test]
    fn happy_path_lifecycle() {
        let now = Timestamp::now();
        let mut b = pending_booking(now);
        b.confirm(now).unwrap();
        b.complete(now).unwrap();
        assert_eq!(b.status, BookingStatus::Completed);
    }

    #[test]
    fn terminal_states_reject_transitions() {
        let now = Timestamp::now();
        let mut b = pending_booking(now);
        b.cancel(Some("sick".into()), now).unwrap();
        assert_eq!(b.cancellation_reason.as_deref(), Some("sick"));

        let err = b.confirm(now).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidStateTransition);
        assert!(b.cancel(None, now).is_err());
    }

    #[test]
    fn pending_cannot_complete() {
        let now = Timestamp::now();
        let mut b = pending_booking(now);
        assert!(b.complete(now).is_err());
        assert_eq!(b.status, BookingStatus::Pending);
    }

    #[test]
    fn no_show_requires_ended_session() {
        let now = Timestamp::now();
        let mut b = pending_booking(now);
        b.confirm(now).unwrap();
        assert!(b.mark_no_show(now).is_err());
        b.mark_no_show(now.plus_minutes(180)).unwrap();
        assert_eq!(b.status, BookingStatus::NoShow);
    }

    #[test]
    fn reschedule_allows_past_but_not_terminal() {
        let now = Timestamp::now();
        let mut b = pending_booking(now);
        b.reschedule(now.plus_minutes(-120), now.plus_minutes(-60), now).unwrap();
        b.cancel(None, now).unwrap();
        assert!(b.reschedule(now.plus_minutes(60), now.plus_minutes(90), now).is_err());
    }

    #[test]
    fn overlap_is_half_open() {
        let now = Timestamp::now();
        let b = pending_booking(now);
        assert!(b.overlaps(&now.plus_minutes(90), &now.plus_minutes(150)));
        assert!(!b.overlaps(&now.plus_minutes(120), &now.plus_minutes(180)));
        assert!(!b.overlaps(&now, &now.plus_minutes(60)));
    }

    #[test]
    fn status_parsing_round_trips() {
        for status in BookingStatus::ALL {
            assert_eq!(status.as_str().parse::<BookingStatus>().unwrap(), status);
        }
        assert!("done".parse::<BookingStatus>().is_err());
    }

    #[test]
    fn append_paragraph_separates_with_blank_line() {
        let mut notes = String::new();
        append_paragraph(&mut notes, "first");
        append_paragraph(&mut notes, "second");
        assert_eq!(notes, "first\n\nsecond");
    }
}
