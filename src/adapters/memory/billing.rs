use async_trait::async_trait;

use super::InMemoryStore;
use crate::domain::billing::{Payment, Subscription, WebhookEvent};
use crate::domain::foundation::{DomainError, Page, PageRequest, Timestamp, TrainerId};
use crate::ports::{
    BillingChange, BillingLedger, CommitOutcome, SubscriptionRepository, WebhookEventRepository,
};

#[async_trait]
impl SubscriptionRepository for InMemoryStore {
    async fn find_by_trainer(&self, trainer_id: TrainerId) -> Result<Option<Subscription>, DomainError> {
        Ok(self.read().await.subscriptions.get(&trainer_id).cloned())
    }

    async fn find_by_external_id(&self, external_subscription_id: &str) -> Result<Option<Subscription>, DomainError> {
        Ok(self
            .read()
            .await
            .subscriptions
            .values()
            .find(|s| s.external_subscription_id.as_deref() == Some(external_subscription_id))
            .cloned())
    }

    async fn save(&self, subscription: &Subscription) -> Result<(), DomainError> {
        self.write()
            .await
            .subscriptions
            .insert(subscription.trainer_id, subscription.clone());
        Ok(())
    }
}

#[async_trait]
impl BillingLedger for InMemoryStore {
    async fn commit(&self, event_id: &str, changes: &[BillingChange], now: Timestamp) -> Result<CommitOutcome, DomainError> {
        let mut state = self.write().await;
        match state.webhook_events.get(event_id) {
            Some(event) if event.processed => return Ok(CommitOutcome::AlreadyProcessed),
            Some(_) => {}
            None => return Err(DomainError::not_found("Webhook event")),
        }

        for change in changes {
            match change {
                BillingChange::UpsertSubscription(subscription) => {
                    state.subscriptions.insert(subscription.trainer_id, subscription.clone());
                }
                BillingChange::UpsertPayment(payment) => {
                    let existing = state
                        .payments
                        .values()
                        .find(|p| p.external_transaction_id == payment.external_transaction_id)
                        .map(|p| (p.id, p.created_at));
                    let mut row = payment.clone();
                    if let Some((id, created_at)) = existing {
                        row.id = id;
                        row.created_at = created_at;
                    }
                    state.payments.insert(row.id, row);
                }
                BillingChange::LinkCustomer { trainer_id, customer_id } => {
                    if let Some(trainer) = state.trainers.get_mut(trainer_id) {
                        trainer.billing_customer_id = Some(customer_id.clone());
                        trainer.updated_at = now;
                    }
                }
            }
        }

        if let Some(event) = state.webhook_events.get_mut(event_id) {
            event.processed = true;
            event.processed_at = Some(now);
            event.error_message = None;
        }
        Ok(CommitOutcome::Applied)
    }

    async fn find_payment(&self, external_transaction_id: &str) -> Result<Option<Payment>, DomainError> {
        Ok(self
            .read()
            .await
            .payments
            .values()
            .find(|p| p.external_transaction_id == external_transaction_id)
            .cloned())
    }

    async fn list_payments(&self, trainer_id: TrainerId, page: PageRequest) -> Result<Page<Payment>, DomainError> {
        let state = self.read().await;
        let mut payments: Vec<Payment> = state
            .payments
            .values()
            .filter(|p| p.trainer_id == trainer_id)
            .cloned()
            .collect();
        payments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(Page::new(page.slice(&payments), payments.len() as u64, page))
    }
}

#[async_trait]
impl WebhookEventRepository for InMemoryStore {
    async fn find(&self, event_id: &str) -> Result<Option<WebhookEvent>, DomainError> {
        Ok(self.read().await.webhook_events.get(event_id).cloned())
    }

    async fn insert_received(&self, event: &WebhookEvent) -> Result<bool, DomainError> {
        let mut state = self.write().await;
        if state.webhook_events.contains_key(&event.event_id) {
            return Ok(false);
        }
        state.webhook_events.insert(event.event_id.clone(), event.clone());
        Ok(true)
    }

    async fn mark_failed(&self, event_id: &str, error_message: &str) -> Result<(), DomainError> {
        if let Some(event) = self.write().await.webhook_events.get_mut(event_id) {
            event.error_message = Some(error_message.to_string());
        }
        Ok(())
    }

    async fn list(&self, unprocessed_only: bool, page: PageRequest) -> Result<Page<WebhookEvent>, DomainError> {
        let state = self.read().await;
        let mut events: Vec<WebhookEvent> = state
            .webhook_events
            .values()
            .filter(|e| !unprocessed_only || !e.processed)
            .cloned()
            .collect();
        events.sort_by(|a, b| b.received_at.cmp(&a.received_at));
        Ok(Page::new(page.slice(&events), events.len() as u64, page))
    }

    async fn delete_processed_before(&self, cutoff: Timestamp) -> Result<u64, DomainError> {
        let mut state = self.write().await;
        let before = state.webhook_events.len();
        state
            .webhook_events
            .retain(|_, e| !(e.processed && e.received_at.is_before(&cutoff)));
        Ok((before - state.webhook_events.len()) as u64)
    }
}
