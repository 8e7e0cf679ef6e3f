//! Notification domain - outbound email/SMS log.

#[allow(clippy::module_inception)]
mod notification;

pub use notification::{dedup_key, Channel, Notification, NotificationStatus};
