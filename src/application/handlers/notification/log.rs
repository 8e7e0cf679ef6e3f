//! The per-trainer delivery log and the jobs that maintain it.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, NotificationId, Page, PageRequest, Timestamp};
use crate::domain::identity::TenantContext;
use crate::domain::notification::{Channel, Notification, NotificationStatus};
use crate::ports::{NotificationRepository, WebhookEventRepository};

pub struct ListNotificationsHandler {
    notifications: Arc<dyn NotificationRepository>,
}

impl ListNotificationsHandler {
    pub fn new(notifications: Arc<dyn NotificationRepository>) -> Self {
        Self { notifications }
    }

    pub async fn handle(
        &self,
        ctx: &TenantContext,
        channel: Option<Channel>,
        status: Option<NotificationStatus>,
        page: PageRequest,
    ) -> Result<Page<Notification>, DomainError> {
        self.notifications.list(ctx.trainer_id, channel, status, page).await
    }
}

/// Operator jobs over the notification and webhook logs.
pub struct NotificationMaintenance {
    notifications: Arc<dyn NotificationRepository>,
    webhook_events: Arc<dyn WebhookEventRepository>,
    webhook_retention_days: i64,
}

impl NotificationMaintenance {
    pub fn new(
        notifications: Arc<dyn NotificationRepository>,
        webhook_events: Arc<dyn WebhookEventRepository>,
        webhook_retention_days: i64,
    ) -> Self {
        Self {
            notifications,
            webhook_events,
            webhook_retention_days,
        }
    }

    /// Puts failed rows back to pending without sending them.
    pub async fn requeue_failed(&self) -> Result<Vec<NotificationId>, DomainError> {
        let ids = self.notifications.requeue_failed(Timestamp::now()).await?;
        tracing::info!(count = ids.len(), "failed notifications requeued");
        Ok(ids)
    }

    /// Drops processed webhook events older than the retention period.
    pub async fn cleanup_webhook_events(&self, now: Timestamp) -> Result<u64, DomainError> {
        let cutoff = now.add_days(-self.webhook_retention_days);
        let removed = self.webhook_events.delete_processed_before(cutoff).await?;
        if removed > 0 {
            tracing::info!(removed, retention_days = self.webhook_retention_days, "webhook events pruned");
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryStore;
    use crate::domain::billing::WebhookEvent;
    use crate::domain::foundation::TrainerId;
    use crate::ports::BillingLedger;

    #[tokio::test]
    async fn requeue_resets_only_failed_rows() {
        let store = InMemoryStore::new();
        let trainer = TrainerId::new();
        let now = Timestamp::now();
        let mut failed = Notification::pending(trainer, Channel::Sms, "+15550100", None, "x".into(), now);
        failed.mark_failed("timeout", now);
        let mut sent = Notification::pending(trainer, Channel::Sms, "+15550101", None, "y".into(), now);
        sent.mark_sent(None, now);
        NotificationRepository::insert(&store, &failed).await.unwrap();
        NotificationRepository::insert(&store, &sent).await.unwrap();

        let maintenance = NotificationMaintenance::new(Arc::new(store.clone()), Arc::new(store.clone()), 90);
        assert_eq!(maintenance.requeue_failed().await.unwrap(), vec![failed.id]);

        let row = store.find_by_id(failed.id).await.unwrap().unwrap();
        assert_eq!(row.status, NotificationStatus::Pending);
        assert!(row.failed_reason.is_none());
    }

    #[tokio::test]
    async fn cleanup_keeps_recent_and_unprocessed_events() {
        let store = InMemoryStore::new();
        let now = Timestamp::now();
        let old = now.add_days(-120);
        for (id, received) in [("evt_old", old), ("evt_new", now), ("evt_pending", old)] {
            WebhookEventRepository::insert_received(&store, &WebhookEvent::received(id, "subscription.updated", serde_json::json!({}), received))
                .await
                .unwrap();
        }
        store.commit("evt_old", &[], now).await.unwrap();
        store.commit("evt_new", &[], now).await.unwrap();

        let maintenance = NotificationMaintenance::new(Arc::new(store.clone()), Arc::new(store.clone()), 90);
        assert_eq!(maintenance.cleanup_webhook_events(now).await.unwrap(), 1);
        assert!(WebhookEventRepository::find(&store, "evt_pending").await.unwrap().is_some());
        assert!(WebhookEventRepository::find(&store, "evt_new").await.unwrap().is_some());
    }
}
