//! Billing ports - subscription state, the webhook ledger and the webhook log.

use async_trait::async_trait;

use crate::domain::billing::{Payment, Subscription, WebhookEvent};
use crate::domain::foundation::{DomainError, Page, PageRequest, Timestamp, TrainerId};

#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    async fn find_by_trainer(&self, trainer_id: TrainerId) -> Result<Option<Subscription>, DomainError>;

    async fn find_by_external_id(&self, external_subscription_id: &str) -> Result<Option<Subscription>, DomainError>;

    /// Insert or replace the trainer's subscription.
    async fn save(&self, subscription: &Subscription) -> Result<(), DomainError>;
}

/// One change produced by reconciling a webhook.
#[derive(Debug, Clone, PartialEq)]
pub enum BillingChange {
    /// Keyed by trainer; the external id is kept unique.
    UpsertSubscription(Subscription),
    /// Keyed by external transaction id; an existing row keeps its id.
    UpsertPayment(Payment),
    /// Records the provider customer id on the trainer.
    LinkCustomer { trainer_id: TrainerId, customer_id: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    Applied,
    /// Another delivery got there first; nothing was written.
    AlreadyProcessed,
}

/// Atomic application of webhook effects.
#[async_trait]
pub trait BillingLedger: Send + Sync {
    /// Applies `changes` and marks the webhook event processed in one
    /// transaction, re-checking the processed flag under a row lock.
    async fn commit(&self, event_id: &str, changes: &[BillingChange], now: Timestamp) -> Result<CommitOutcome, DomainError>;

    async fn find_payment(&self, external_transaction_id: &str) -> Result<Option<Payment>, DomainError>;

    /// Provider payments of one trainer, newest first.
    async fn list_payments(&self, trainer_id: TrainerId, page: PageRequest) -> Result<Page<Payment>, DomainError>;
}

#[async_trait]
pub trait WebhookEventRepository: Send + Sync {
    async fn find(&self, event_id: &str) -> Result<Option<WebhookEvent>, DomainError>;

    /// Stores the event unless one with the same id exists. Returns whether
    /// a row was inserted.
    async fn insert_received(&self, event: &WebhookEvent) -> Result<bool, DomainError>;

    async fn mark_failed(&self, event_id: &str, error_message: &str) -> Result<(), DomainError>;

    /// Newest first; `unprocessed_only` filters to rows still pending.
    async fn list(&self, unprocessed_only: bool, page: PageRequest) -> Result<Page<WebhookEvent>, DomainError>;

    /// Retention: drops processed rows received before `cutoff`.
    async fn delete_processed_before(&self, cutoff: Timestamp) -> Result<u64, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(dead_code)]
    fn assert_object_safe(_: &dyn SubscriptionRepository, _: &dyn BillingLedger, _: &dyn WebhookEventRepository) {}
}
