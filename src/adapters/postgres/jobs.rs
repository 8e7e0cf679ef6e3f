use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use uuid::Uuid;

use super::{db_error, dt, opt_dt, opt_ts, ts, PostgresStore};
use crate::domain::foundation::{DomainError, JobId, Timestamp};
use crate::ports::{Job, JobKind, JobQueue, JobStatus};

#[derive(Debug, sqlx::FromRow)]
struct JobRow {
    id: Uuid,
    kind: Json<JobKind>,
    status: String,
    run_at: DateTime<Utc>,
    attempts: i32,
    max_attempts: i32,
    last_error: Option<String>,
    locked_until: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<JobRow> for Job {
    type Error = DomainError;

    fn try_from(row: JobRow) -> Result<Self, Self::Error> {
        let status = match row.status.as_str() {
            "queued" => JobStatus::Queued,
            "running" => JobStatus::Running,
            "done" => JobStatus::Done,
            "dead" => JobStatus::Dead,
            other => return Err(DomainError::database(format!("Invalid job status '{}'", other))),
        };
        Ok(Job {
            id: JobId::from_uuid(row.id),
            kind: row.kind.0,
            status,
            run_at: ts(row.run_at),
            attempts: row.attempts.max(0) as u32,
            max_attempts: row.max_attempts.max(0) as u32,
            last_error: row.last_error,
            locked_until: opt_ts(row.locked_until),
            created_at: ts(row.created_at),
        })
    }
}

const JOB_COLUMNS: &str = "id, kind, status, run_at, attempts, max_attempts, last_error, locked_until, created_at";

impl PostgresStore {
    async fn save_job_outcome(&self, job: &Job) -> Result<(), DomainError> {
        sqlx::query(
            "UPDATE jobs SET status = $2, run_at = $3, last_error = $4, locked_until = $5 WHERE id = $1",
        )
        .bind(job.id.as_uuid())
        .bind(job.status.as_str())
        .bind(dt(&job.run_at))
        .bind(&job.last_error)
        .bind(opt_dt(&job.locked_until))
        .execute(self.pool())
        .await
        .map_err(db_error("Failed to update job"))?;
        Ok(())
    }

    async fn load_job(&self, id: JobId) -> Result<Job, DomainError> {
        let sql = format!("SELECT {} FROM jobs WHERE id = $1", JOB_COLUMNS);
        let row: Option<JobRow> = sqlx::query_as(&sql)
            .bind(id.as_uuid())
            .fetch_optional(self.pool())
            .await
            .map_err(db_error("Failed to find job"))?;
        row.map(Job::try_from)
            .transpose()?
            .ok_or_else(|| DomainError::not_found("Job"))
    }
}

#[async_trait]
impl JobQueue for PostgresStore {
    async fn enqueue(&self, job: &Job) -> Result<(), DomainError> {
        sqlx::query(&format!(
            "INSERT INTO jobs ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
            JOB_COLUMNS
        ))
        .bind(job.id.as_uuid())
        .bind(Json(&job.kind))
        .bind(job.status.as_str())
        .bind(dt(&job.run_at))
        .bind(i32::try_from(job.attempts).unwrap_or(i32::MAX))
        .bind(i32::try_from(job.max_attempts).unwrap_or(i32::MAX))
        .bind(&job.last_error)
        .bind(opt_dt(&job.locked_until))
        .bind(dt(&job.created_at))
        .execute(self.pool())
        .await
        .map_err(db_error("Failed to enqueue job"))?;
        Ok(())
    }

    async fn claim_due(&self, now: Timestamp, limit: u32, lease_secs: i64) -> Result<Vec<Job>, DomainError> {
        let sql = format!(
            r#"
            UPDATE jobs SET
                status = 'running',
                attempts = attempts + 1,
                locked_until = $1 + make_interval(secs => $3)
            WHERE id IN (
                SELECT id FROM jobs
                WHERE (status = 'queued' AND run_at <= $1)
                   OR (status = 'running' AND (locked_until IS NULL OR locked_until < $1))
                ORDER BY run_at, created_at
                LIMIT $2
                FOR UPDATE SKIP LOCKED
            )
            RETURNING {}
            "#,
            JOB_COLUMNS
        );
        let rows: Vec<JobRow> = sqlx::query_as(&sql)
            .bind(dt(&now))
            .bind(i64::from(limit))
            .bind(lease_secs as f64)
            .fetch_all(self.pool())
            .await
            .map_err(db_error("Failed to claim jobs"))?;

        let mut jobs = rows.into_iter().map(Job::try_from).collect::<Result<Vec<_>, _>>()?;
        jobs.sort_by_key(|j| (j.run_at, j.created_at));
        Ok(jobs)
    }

    async fn complete(&self, id: JobId) -> Result<(), DomainError> {
        let mut job = self.load_job(id).await?;
        job.complete();
        self.save_job_outcome(&job).await
    }

    async fn fail(&self, id: JobId, error: &str, retry_at: Option<Timestamp>) -> Result<(), DomainError> {
        let mut job = self.load_job(id).await?;
        job.fail(error, retry_at);
        self.save_job_outcome(&job).await
    }
}
