//! JobExecutor - routes queued jobs to the handler that owns them.

use async_trait::async_trait;
use std::sync::Arc;

use crate::application::handlers::notification::{BookingMessenger, NotificationDispatcher, NotificationMaintenance};
use crate::application::handlers::workflow::ExecutionRunner;
use crate::domain::foundation::{DomainError, Timestamp};
use crate::ports::{Job, JobHandler, JobKind};

pub struct JobExecutor {
    runner: Arc<ExecutionRunner>,
    messenger: Arc<BookingMessenger>,
    dispatcher: NotificationDispatcher,
    maintenance: Arc<NotificationMaintenance>,
}

impl JobExecutor {
    pub fn new(
        runner: Arc<ExecutionRunner>,
        messenger: Arc<BookingMessenger>,
        dispatcher: NotificationDispatcher,
        maintenance: Arc<NotificationMaintenance>,
    ) -> Self {
        Self {
            runner,
            messenger,
            dispatcher,
            maintenance,
        }
    }
}

#[async_trait]
impl JobHandler for JobExecutor {
    async fn run(&self, job: &Job) -> Result<(), DomainError> {
        match &job.kind {
            JobKind::RunWorkflowExecution { execution_id } => {
                let execution = self.runner.run(*execution_id).await?;
                tracing::debug!(execution_id = %execution.id, status = execution.status.as_str(), "workflow execution ran");
            }
            JobKind::SendBookingConfirmation { booking_id } => {
                self.messenger.send_confirmation(*booking_id).await?;
            }
            JobKind::ScanBookingReminders => {
                self.messenger.scan_reminders(Timestamp::now()).await?;
            }
            JobKind::DeliverNotification { notification_id } => {
                self.dispatcher.deliver(*notification_id).await?;
            }
            JobKind::RequeueFailedNotifications => {
                self.maintenance.requeue_failed().await?;
            }
            JobKind::CleanupWebhookEvents => {
                self.maintenance.cleanup_webhook_events(Timestamp::now()).await?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::jobs::{JobRunner, JobRunnerConfig};
    use crate::adapters::notifications::RecordingTransport;
    use crate::application::handlers::test_support::Fixture;
    use crate::domain::entitlement::Plan;
    use crate::domain::scheduling::Booking;
    use crate::ports::{enqueue_now, BookingRepository};

    #[tokio::test]
    async fn confirmation_job_sends_through_the_runner() {
        let fx = Fixture::new(Plan::Free).await;
        let store = Arc::new(fx.store.clone());
        let email = RecordingTransport::new();
        let dispatcher = NotificationDispatcher::new(store.clone(), Arc::new(email.clone()), Arc::new(RecordingTransport::new()));
        let executor = JobExecutor::new(
            Arc::new(ExecutionRunner::new(store.clone(), store.clone(), store.clone(), store.clone(), store.clone(), dispatcher.clone())),
            Arc::new(BookingMessenger::new(store.clone(), store.clone(), store.clone(), dispatcher.clone())),
            dispatcher,
            Arc::new(NotificationMaintenance::new(store.clone(), store.clone(), 90)),
        );

        let client = fx.client("Ari", "ari@example.com").await;
        let now = Timestamp::now();
        let start = now.plus_minutes(600);
        let mut booking = Booking::schedule(fx.ctx.trainer_id, client.id, start, start.plus_minutes(45), None, None, now).unwrap();
        booking.confirm(now).unwrap();
        fx.store.insert_checked(&booking).await.unwrap();
        enqueue_now(store.as_ref(), JobKind::SendBookingConfirmation { booking_id: booking.id }).await.unwrap();

        let runner = JobRunner::new(store, Arc::new(executor), JobRunnerConfig::default());
        assert_eq!(runner.drain().await.unwrap(), 1);
        assert_eq!(email.sent().len(), 1);
    }
}
