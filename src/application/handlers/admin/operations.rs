//! AdminOperationsHandler - audit log, webhook log and operator jobs.

use serde::Serialize;
use serde_json::{json, Value as JsonValue};
use std::collections::BTreeMap;
use std::sync::Arc;

use super::actor::AdminActor;
use crate::application::handlers::billing::{BillingReconciler, ReconcileOutcome};
use crate::application::handlers::notification::NotificationMaintenance;
use crate::domain::admin::{AdminAction, AdminActionKind};
use crate::domain::billing::{WebhookError, WebhookEvent};
use crate::domain::foundation::{DomainError, NotificationId, Page, PageRequest};
use crate::ports::{enqueue_now, AdminRepository, JobKind, JobQueue, WebhookEventRepository};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequeueResult {
    pub requeued: Vec<NotificationId>,
    /// Whether delivery jobs were queued for the requeued rows.
    pub delivery_scheduled: bool,
}

pub struct AdminOperationsHandler {
    admin: Arc<dyn AdminRepository>,
    webhook_events: Arc<dyn WebhookEventRepository>,
    reconciler: Arc<BillingReconciler>,
    maintenance: Arc<NotificationMaintenance>,
    jobs: Arc<dyn JobQueue>,
}

impl AdminOperationsHandler {
    pub fn new(
        admin: Arc<dyn AdminRepository>,
        webhook_events: Arc<dyn WebhookEventRepository>,
        reconciler: Arc<BillingReconciler>,
        maintenance: Arc<NotificationMaintenance>,
        jobs: Arc<dyn JobQueue>,
    ) -> Self {
        Self {
            admin,
            webhook_events,
            reconciler,
            maintenance,
            jobs,
        }
    }

    pub async fn list_actions(&self, _actor: &AdminActor, page: PageRequest) -> Result<Page<AdminAction>, DomainError> {
        self.admin.list_actions(page).await
    }

    pub async fn list_webhooks(&self, _actor: &AdminActor, unprocessed_only: bool, page: PageRequest) -> Result<Page<WebhookEvent>, DomainError> {
        self.webhook_events.list(unprocessed_only, page).await
    }

    /// Reprocesses a stored webhook without signature verification. The
    /// attempt is audited whether or not it succeeds.
    pub async fn replay_webhook(&self, actor: &AdminActor, event_id: &str) -> Result<ReconcileOutcome, WebhookError> {
        let result = self.reconciler.replay(event_id).await;

        let mut details = BTreeMap::new();
        details.insert("event_id".to_string(), JsonValue::from(event_id));
        details.insert(
            "outcome".to_string(),
            match &result {
                Ok(outcome) => json!(format!("{:?}", outcome)),
                Err(e) => json!(e.code()),
            },
        );
        self.admin
            .append_action(&actor.audit(AdminActionKind::ReplayWebhook, None, details))
            .await?;
        result
    }

    /// Resets failed notifications to pending. With `deliver`, a delivery
    /// job is queued for each of them.
    pub async fn requeue_failed_notifications(&self, actor: &AdminActor, deliver: bool) -> Result<RequeueResult, DomainError> {
        let requeued = self.maintenance.requeue_failed().await?;
        if deliver {
            for id in &requeued {
                enqueue_now(self.jobs.as_ref(), JobKind::DeliverNotification { notification_id: *id }).await?;
            }
        }

        let mut details = BTreeMap::new();
        details.insert("count".to_string(), json!(requeued.len()));
        details.insert("deliver".to_string(), json!(deliver));
        self.admin
            .append_action(&actor.audit(AdminActionKind::RequeueNotifications, None, details))
            .await?;
        Ok(RequeueResult {
            requeued,
            delivery_scheduled: deliver,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::events::LocalEventBus;
    use crate::adapters::memory::InMemoryStore;
    use crate::domain::admin::RequestOrigin;
    use crate::domain::billing::PriceCatalog;
    use crate::domain::foundation::{PrincipalId, Timestamp, TrainerId};
    use crate::domain::notification::{Channel, Notification};
    use crate::ports::NotificationRepository;

    fn handler(store: &InMemoryStore) -> AdminOperationsHandler {
        let shared = Arc::new(store.clone());
        let reconciler = BillingReconciler::new(
            shared.clone(),
            shared.clone(),
            shared.clone(),
            shared.clone(),
            Arc::new(LocalEventBus::new()),
            Some("secret".into()),
            PriceCatalog::default(),
        );
        AdminOperationsHandler::new(
            shared.clone(),
            shared.clone(),
            Arc::new(reconciler),
            Arc::new(NotificationMaintenance::new(shared.clone(), shared.clone(), 90)),
            shared,
        )
    }

    fn actor() -> AdminActor {
        AdminActor {
            principal_id: PrincipalId::new(),
            origin: RequestOrigin::default(),
        }
    }

    #[tokio::test]
    async fn replay_of_unknown_event_is_audited() {
        let store = InMemoryStore::new();
        let handler = handler(&store);
        let err = handler.replay_webhook(&actor(), "evt_missing").await.unwrap_err();
        assert!(matches!(err, WebhookError::EventNotFound));

        let audit = handler.list_actions(&actor(), PageRequest::default()).await.unwrap();
        assert_eq!(audit.items[0].kind, AdminActionKind::ReplayWebhook);
        assert_eq!(audit.items[0].details["outcome"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn requeue_can_schedule_delivery() {
        let store = InMemoryStore::new();
        let now = Timestamp::now();
        let mut failed = Notification::pending(TrainerId::new(), Channel::Email, "a@x.io", Some("s".into()), "b".into(), now);
        failed.mark_failed("timeout", now);
        NotificationRepository::insert(&store, &failed).await.unwrap();

        let result = handler(&store).requeue_failed_notifications(&actor(), true).await.unwrap();
        assert_eq!(result.requeued, vec![failed.id]);

        let jobs = store.claim_due(Timestamp::now(), 10, 60).await.unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].kind, JobKind::DeliverNotification { notification_id: failed.id });
    }
}
