use async_trait::async_trait;

use super::InMemoryStore;
use crate::domain::foundation::{DomainError, JobId, Timestamp};
use crate::ports::{Job, JobQueue};

#[async_trait]
impl JobQueue for InMemoryStore {
    async fn enqueue(&self, job: &Job) -> Result<(), DomainError> {
        self.write().await.jobs.insert(job.id, job.clone());
        Ok(())
    }

    async fn claim_due(&self, now: Timestamp, limit: u32, lease_secs: i64) -> Result<Vec<Job>, DomainError> {
        let mut state = self.write().await;
        let mut due: Vec<&mut Job> = state.jobs.values_mut().filter(|j| j.is_claimable(now)).collect();
        due.sort_by_key(|j| (j.run_at, j.created_at));
        Ok(due
            .into_iter()
            .take(limit as usize)
            .map(|job| {
                job.claim(now, lease_secs);
                job.clone()
            })
            .collect())
    }

    async fn complete(&self, id: JobId) -> Result<(), DomainError> {
        match self.write().await.jobs.get_mut(&id) {
            Some(job) => {
                job.complete();
                Ok(())
            }
            None => Err(DomainError::not_found("Job")),
        }
    }

    async fn fail(&self, id: JobId, error: &str, retry_at: Option<Timestamp>) -> Result<(), DomainError> {
        match self.write().await.jobs.get_mut(&id) {
            Some(job) => {
                job.fail(error, retry_at);
                Ok(())
            }
            None => Err(DomainError::not_found("Job")),
        }
    }
}
