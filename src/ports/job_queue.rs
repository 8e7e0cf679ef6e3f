//! JobQueue port - durable at-least-once background work.
//!
//! Request handlers never call slow collaborators (mail, SMS) inline; they
//! enqueue a job. The runner leases due jobs, hands them to a `JobHandler`
//! and records the outcome. A lease that expires (crash mid-run) makes the
//! job claimable again, so handlers must be idempotent.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    BookingId, DomainError, ExecutionId, JobId, NotificationId, Timestamp,
};

/// What a job does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JobKind {
    RunWorkflowExecution { execution_id: ExecutionId },
    SendBookingConfirmation { booking_id: BookingId },
    ScanBookingReminders,
    DeliverNotification { notification_id: NotificationId },
    RequeueFailedNotifications,
    CleanupWebhookEvents,
}

impl JobKind {
    pub fn name(&self) -> &'static str {
        match self {
            JobKind::RunWorkflowExecution { .. } => "run_workflow_execution",
            JobKind::SendBookingConfirmation { .. } => "send_booking_confirmation",
            JobKind::ScanBookingReminders => "scan_booking_reminders",
            JobKind::DeliverNotification { .. } => "deliver_notification",
            JobKind::RequeueFailedNotifications => "requeue_failed_notifications",
            JobKind::CleanupWebhookEvents => "cleanup_webhook_events",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Running,
    Done,
    /// Out of attempts.
    Dead,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Running => "running",
            JobStatus::Done => "done",
            JobStatus::Dead => "dead",
        }
    }
}

/// A row in the job table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub kind: JobKind,
    pub status: JobStatus,
    pub run_at: Timestamp,
    pub attempts: u32,
    pub max_attempts: u32,
    pub last_error: Option<String>,
    pub locked_until: Option<Timestamp>,
    pub created_at: Timestamp,
}

pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

impl Job {
    pub fn new(kind: JobKind, run_at: Timestamp, now: Timestamp) -> Self {
        Self {
            id: JobId::new(),
            kind,
            status: JobStatus::Queued,
            run_at,
            attempts: 0,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            last_error: None,
            locked_until: None,
            created_at: now,
        }
    }

    /// Whether the job may be leased at `now`: queued and due, or running
    /// with an expired lease.
    pub fn is_claimable(&self, now: Timestamp) -> bool {
        match self.status {
            JobStatus::Queued => !self.run_at.is_after(&now),
            JobStatus::Running => self.locked_until.map_or(true, |until| until.is_before(&now)),
            JobStatus::Done | JobStatus::Dead => false,
        }
    }

    /// Leases the job, counting the attempt.
    pub fn claim(&mut self, now: Timestamp, lease_secs: i64) {
        self.status = JobStatus::Running;
        self.attempts += 1;
        self.locked_until = Some(now.plus_secs(lease_secs));
    }

    pub fn complete(&mut self) {
        self.status = JobStatus::Done;
        self.locked_until = None;
        self.last_error = None;
    }

    /// Schedules a retry, or kills the job when attempts are spent or no
    /// retry time is given.
    pub fn fail(&mut self, error: &str, retry_at: Option<Timestamp>) {
        self.last_error = Some(error.to_string());
        self.locked_until = None;
        match retry_at {
            Some(at) if self.attempts < self.max_attempts => {
                self.status = JobStatus::Queued;
                self.run_at = at;
            }
            _ => self.status = JobStatus::Dead,
        }
    }
}

/// Exponential backoff for retry `attempt` (1-based): 30s, 60s, 120s ...
/// capped at one hour.
pub fn retry_delay_secs(attempt: u32) -> i64 {
    let exp = attempt.saturating_sub(1).min(7);
    (30i64 << exp).min(3600)
}

#[async_trait]
pub trait JobQueue: Send + Sync {
    async fn enqueue(&self, job: &Job) -> Result<(), DomainError>;

    /// Leases up to `limit` claimable jobs, oldest `run_at` first.
    async fn claim_due(&self, now: Timestamp, limit: u32, lease_secs: i64) -> Result<Vec<Job>, DomainError>;

    async fn complete(&self, id: JobId) -> Result<(), DomainError>;

    /// See [`Job::fail`].
    async fn fail(&self, id: JobId, error: &str, retry_at: Option<Timestamp>) -> Result<(), DomainError>;
}

/// Executes one job. Errors are retried with backoff.
#[async_trait]
pub trait JobHandler: Send + Sync {
    async fn run(&self, job: &Job) -> Result<(), DomainError>;
}

/// Convenience for enqueueing a job due now.
pub async fn enqueue_now(queue: &dyn JobQueue, kind: JobKind) -> Result<Job, DomainError> {
    let now = Timestamp::now();
    let job = Job::new(kind, now, now);
    queue.enqueue(&job).await?;
    Ok(job)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn kinds_serialize_with_a_tag() {
        let kind = JobKind::ScanBookingReminders;
        assert_eq!(serde_json::to_value(&kind).unwrap(), json!({"kind": "scan_booking_reminders"}));
        assert_eq!(kind.name(), "scan_booking_reminders");
    }

    #[test]
    fn lease_expiry_makes_running_jobs_claimable() {
        let now = Timestamp::now();
        let mut job = Job::new(JobKind::CleanupWebhookEvents, now, now);
        assert!(job.is_claimable(now));

        job.claim(now, 60);
        assert_eq!(job.attempts, 1);
        assert!(!job.is_claimable(now.plus_secs(30)));
        assert!(job.is_claimable(now.plus_secs(61)));
    }

    #[test]
    fn failures_retry_until_attempts_run_out() {
        let now = Timestamp::now();
        let mut job = Job::new(JobKind::ScanBookingReminders, now, now);
        job.max_attempts = 2;

        job.claim(now, 60);
        job.fail("boom", Some(now.plus_secs(30)));
        assert_eq!(job.status, JobStatus::Queued);
        assert!(!job.is_claimable(now));

        job.claim(now.plus_secs(30), 60);
        job.fail("boom again", Some(now.plus_secs(90)));
        assert_eq!(job.status, JobStatus::Dead);
        assert_eq!(job.last_error.as_deref(), Some("boom again"));
    }

    #[test]
    fn backoff_doubles_and_caps() {
        assert_eq!(retry_delay_secs(1), 30);
        assert_eq!(retry_delay_secs(2), 60);
        assert_eq!(retry_delay_secs(3), 120);
        assert_eq!(retry_delay_secs(20), 3600);
    }
}
