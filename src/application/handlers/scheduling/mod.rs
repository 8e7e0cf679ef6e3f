//! Scheduling handlers - availability, slots and the booking lifecycle.

mod availability;
mod available_slots;
mod bookings;
mod create_booking;
mod transition_booking;

pub use availability::{ManageAvailabilityHandler, RuleInput};
pub use available_slots::AvailableSlotsHandler;
pub use bookings::{ListBookingsHandler, RescheduleBookingCommand, RescheduleBookingHandler};
pub use create_booking::{CreateBookingCommand, CreateBookingHandler};
pub use transition_booking::{BookingTransition, TransitionBookingHandler};

use crate::domain::foundation::{BookingId, DomainError, ErrorCode};

pub(crate) fn booking_conflict(existing: BookingId) -> DomainError {
    DomainError::new(
        ErrorCode::BookingConflict,
        "This time slot conflicts with an existing booking",
    )
    .with_detail("conflicting_booking_id", existing.to_string())
}
