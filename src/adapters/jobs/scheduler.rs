//! Periodic enqueueing of maintenance jobs.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{self, MissedTickBehavior};

use crate::config::JobsConfig;
use crate::ports::{enqueue_now, JobKind, JobQueue};

#[derive(Debug, Clone)]
pub struct ScheduledJob {
    pub kind: JobKind,
    pub every: Duration,
}

pub struct PeriodicScheduler {
    queue: Arc<dyn JobQueue>,
    schedule: Vec<ScheduledJob>,
}

impl PeriodicScheduler {
    pub fn new(queue: Arc<dyn JobQueue>, schedule: Vec<ScheduledJob>) -> Self {
        Self { queue, schedule }
    }

    /// Reminder scan and webhook retention cleanup at their configured periods.
    pub fn from_config(queue: Arc<dyn JobQueue>, config: &JobsConfig) -> Self {
        Self::new(
            queue,
            vec![
                ScheduledJob {
                    kind: JobKind::ScanBookingReminders,
                    every: config.reminder_scan_interval(),
                },
                ScheduledJob {
                    kind: JobKind::CleanupWebhookEvents,
                    every: config.webhook_cleanup_interval(),
                },
            ],
        )
    }

    /// One ticking task per entry; each enqueues on its first tick and then
    /// once per period until shutdown.
    pub async fn run(&self, shutdown: watch::Receiver<bool>) {
        let tasks = self.schedule.iter().cloned().map(|entry| {
            let queue = Arc::clone(&self.queue);
            let mut shutdown = shutdown.clone();
            async move {
                let mut ticker = time::interval(entry.every);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
                loop {
                    tokio::select! {
                        changed = shutdown.changed() => {
                            if changed.is_err() || *shutdown.borrow() {
                                return;
                            }
                        }
                        _ = ticker.tick() => {
                            if let Err(e) = enqueue_now(queue.as_ref(), entry.kind.clone()).await {
                                tracing::error!(kind = entry.kind.name(), error = %e, "failed to enqueue periodic job");
                            }
                        }
                    }
                }
            }
        });
        futures::future::join_all(tasks).await;
    }
}
