//! Notification handlers - outbound messages, booking messages, the
//! delivery log and its maintenance jobs.

mod booking_messages;
mod dispatcher;
mod log;

pub use booking_messages::{BookingMessenger, REMINDER_WINDOW_MINUTES};
pub use dispatcher::{DispatchOutcome, MessageRequest, NotificationDispatcher, DEFAULT_SEND_TIMEOUT};
pub use log::{ListNotificationsHandler, NotificationMaintenance};
