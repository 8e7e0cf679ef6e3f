//! Scheduling domain - availability, breaks, slots and bookings.

mod availability_rule;
mod booking;
mod break_period;
pub mod slots;

pub use availability_rule::{parse_time_of_day, AvailabilityRule};
pub use booking::{append_paragraph, Booking, BookingStatus};
pub use break_period::BreakPeriod;
pub use slots::{candidate_slots, remove_conflicts, slot_instant, SlotMap, SlotWindow};
