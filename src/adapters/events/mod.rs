//! Event bus adapters.
//!
//! - `LocalEventBus` - in-process, after-commit delivery to registered handlers

mod local_bus;

pub use local_bus::LocalEventBus;
