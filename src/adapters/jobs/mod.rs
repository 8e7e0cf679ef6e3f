//! Background job processing.
//!
//! - `JobRunner` - leases due jobs from the `JobQueue` and hands them to a
//!   `JobHandler`, rescheduling failures with backoff
//! - `PeriodicScheduler` - enqueues recurring maintenance jobs
//!
//! Both loops stop on a `watch` shutdown signal after finishing the batch
//! in hand.

mod runner;
mod scheduler;

pub use runner::{JobRunner, JobRunnerConfig};
pub use scheduler::{PeriodicScheduler, ScheduledJob};
