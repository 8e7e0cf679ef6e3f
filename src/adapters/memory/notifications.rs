use async_trait::async_trait;

use super::InMemoryStore;
use crate::domain::foundation::{DomainError, NotificationId, Page, PageRequest, Timestamp, TrainerId};
use crate::domain::notification::{Channel, Notification, NotificationStatus};
use crate::ports::NotificationRepository;

#[async_trait]
impl NotificationRepository for InMemoryStore {
    async fn insert(&self, notification: &Notification) -> Result<(), DomainError> {
        self.write().await.notifications.insert(notification.id, notification.clone());
        Ok(())
    }

    async fn update(&self, notification: &Notification) -> Result<(), DomainError> {
        let mut state = self.write().await;
        match state.notifications.get_mut(&notification.id) {
            Some(existing) => {
                *existing = notification.clone();
                Ok(())
            }
            None => Err(DomainError::not_found("Notification")),
        }
    }

    async fn find_by_id(&self, id: NotificationId) -> Result<Option<Notification>, DomainError> {
        Ok(self.read().await.notifications.get(&id).cloned())
    }

    async fn list(
        &self,
        trainer_id: TrainerId,
        channel: Option<Channel>,
        status: Option<NotificationStatus>,
        page: PageRequest,
    ) -> Result<Page<Notification>, DomainError> {
        let state = self.read().await;
        let mut rows: Vec<Notification> = state
            .notifications
            .values()
            .filter(|n| {
                n.trainer_id == trainer_id
                    && channel.map_or(true, |c| n.channel == c)
                    && status.map_or(true, |s| n.status == s)
            })
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(Page::new(page.slice(&rows), rows.len() as u64, page))
    }

    async fn exists_sent_with_key(&self, trainer_id: TrainerId, dedup_key: &str) -> Result<bool, DomainError> {
        Ok(self.read().await.notifications.values().any(|n| {
            n.trainer_id == trainer_id && n.status == NotificationStatus::Sent && n.dedup_key == dedup_key
        }))
    }

    async fn requeue_failed(&self, now: Timestamp) -> Result<Vec<NotificationId>, DomainError> {
        let mut state = self.write().await;
        let mut ids: Vec<NotificationId> = state
            .notifications
            .values_mut()
            .filter_map(|n| n.requeue(now).then_some(n.id))
            .collect();
        ids.sort();
        Ok(ids)
    }
}
