//! JobRunner - polls the durable job queue.
//!
//! Jobs are delivered at least once: a claim takes a lease
//! (`locked_until`), and a job whose worker died becomes claimable again
//! when the lease runs out. Handlers must therefore be idempotent.
//!
//! ## Configuration
//!
//! | Setting | Default | Description |
//! |---------|---------|-------------|
//! | `poll_interval` | 1s | Sleep between polls when the queue is idle |
//! | `batch_size` | 20 | Max jobs leased per poll |
//! | `lease_secs` | 300 | Lease length per claim |

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time;

use crate::config::JobsConfig;
use crate::domain::foundation::{DomainError, Timestamp};
use crate::ports::{retry_delay_secs, Job, JobHandler, JobQueue};

#[derive(Debug, Clone)]
pub struct JobRunnerConfig {
    pub poll_interval: Duration,
    pub batch_size: u32,
    pub lease_secs: i64,
}

impl Default for JobRunnerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            batch_size: 20,
            lease_secs: 300,
        }
    }
}

impl From<&JobsConfig> for JobRunnerConfig {
    fn from(config: &JobsConfig) -> Self {
        Self {
            poll_interval: config.poll_interval(),
            batch_size: config.batch_size,
            lease_secs: config.lease_secs,
        }
    }
}

pub struct JobRunner {
    queue: Arc<dyn JobQueue>,
    handler: Arc<dyn JobHandler>,
    config: JobRunnerConfig,
}

impl JobRunner {
    pub fn new(queue: Arc<dyn JobQueue>, handler: Arc<dyn JobHandler>, config: JobRunnerConfig) -> Self {
        Self { queue, handler, config }
    }

    /// Run until the shutdown flag flips to `true`.
    ///
    /// A full batch is followed immediately by another poll; a partial one
    /// waits for the poll interval.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(batch_size = self.config.batch_size, "job runner started");
        loop {
            let processed = match self.run_once().await {
                Ok(n) => n,
                Err(e) => {
                    tracing::error!(error = %e, "job poll failed");
                    0
                }
            };

            if *shutdown.borrow() {
                break;
            }
            if processed as u32 >= self.config.batch_size {
                continue;
            }

            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                _ = time::sleep(self.config.poll_interval) => {}
            }
        }
        tracing::info!("job runner stopped");
    }

    /// Lease one batch of due jobs and process it sequentially.
    pub async fn run_once(&self) -> Result<usize, DomainError> {
        let jobs = self
            .queue
            .claim_due(Timestamp::now(), self.config.batch_size, self.config.lease_secs)
            .await?;
        let count = jobs.len();
        for job in jobs {
            self.process(job).await?;
        }
        Ok(count)
    }

    /// Drain everything that is due right now. Used by tests and by
    /// single-shot maintenance runs.
    pub async fn drain(&self) -> Result<usize, DomainError> {
        let mut total = 0;
        loop {
            let n = self.run_once().await?;
            total += n;
            if n == 0 {
                return Ok(total);
            }
        }
    }

    async fn process(&self, job: Job) -> Result<(), DomainError> {
        match self.handler.run(&job).await {
            Ok(()) => {
                tracing::debug!(job_id = %job.id, kind = job.kind.name(), "job done");
                self.queue.complete(job.id).await
            }
            Err(e) => {
                let retry_at = (job.attempts < job.max_attempts)
                    .then(|| Timestamp::now().plus_secs(retry_delay_secs(job.attempts)));
                if retry_at.is_some() {
                    tracing::warn!(
                        job_id = %job.id,
                        kind = job.kind.name(),
                        attempt = job.attempts,
                        error = %e,
                        "job failed, will retry"
                    );
                } else {
                    tracing::error!(
                        job_id = %job.id,
                        kind = job.kind.name(),
                        attempts = job.attempts,
                        error = %e,
                        "job failed permanently"
                    );
                }
                self.queue.fail(job.id, &e.to_string(), retry_at).await
            }
        }
    }
}
