//! BillingReconciler - applies Paddle notifications to subscription and
//! payment state.
//!
//! Every delivery is recorded in the webhook log before anything else is
//! written. The ledger commit re-checks the processed flag under lock, so
//! concurrent deliveries of the same event apply their changes once.

use std::sync::Arc;

use crate::application::events::publish_after_commit;
use crate::domain::billing::{
    PaddleEvent, PaddleEventKind, PaddleWebhookVerifier, Payment, PaymentStatus, PriceCatalog,
    Subscription, SubscriptionSnapshot, SubscriptionStatus, TransactionSnapshot, WebhookError,
    WebhookEvent,
};
use crate::domain::foundation::{PaymentId, Timestamp, TrainerId};
use crate::domain::identity::Trainer;
use crate::domain::workflow::TenantEvent;
use crate::ports::{
    BillingChange, BillingLedger, CommitOutcome, EventPublisher, SubscriptionRepository,
    TrainerRepository, WebhookEventRepository,
};

/// Result of reconciling one delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Changes were committed and the event marked processed.
    Applied { event_type: String },
    /// Event type we do not act on; marked processed with no changes.
    Acknowledged { event_type: String },
    /// A previous delivery already processed this event.
    AlreadyProcessed,
}

/// Changes planned for one event plus what to publish once they commit.
struct Plan {
    changes: Vec<BillingChange>,
    events: Vec<TenantEvent>,
}

impl Plan {
    fn empty() -> Self {
        Self {
            changes: Vec::new(),
            events: Vec::new(),
        }
    }
}

pub struct BillingReconciler {
    webhook_events: Arc<dyn WebhookEventRepository>,
    ledger: Arc<dyn BillingLedger>,
    subscriptions: Arc<dyn SubscriptionRepository>,
    trainers: Arc<dyn TrainerRepository>,
    publisher: Arc<dyn EventPublisher>,
    verifier: Option<PaddleWebhookVerifier>,
    catalog: PriceCatalog,
}

impl BillingReconciler {
    pub fn new(
        webhook_events: Arc<dyn WebhookEventRepository>,
        ledger: Arc<dyn BillingLedger>,
        subscriptions: Arc<dyn SubscriptionRepository>,
        trainers: Arc<dyn TrainerRepository>,
        publisher: Arc<dyn EventPublisher>,
        webhook_secret: Option<String>,
        catalog: PriceCatalog,
    ) -> Self {
        Self {
            webhook_events,
            ledger,
            subscriptions,
            trainers,
            publisher,
            verifier: webhook_secret
                .filter(|s| !s.is_empty())
                .map(PaddleWebhookVerifier::new),
            catalog,
        }
    }

    /// Verifies and applies a raw delivery.
    pub async fn apply(&self, payload: &[u8], signature: Option<&str>) -> Result<ReconcileOutcome, WebhookError> {
        let verifier = self.verifier.as_ref().ok_or(WebhookError::NotConfigured)?;
        let signature = signature.ok_or(WebhookError::InvalidSignature)?;
        let now = Timestamp::now();
        verifier.verify(payload, signature, now)?;

        let event = PaddleEvent::parse(payload)?;
        let stored = serde_json::from_slice(payload).map_err(|e| WebhookError::ParseError(e.to_string()))?;

        if let Some(existing) = self.webhook_events.find(&event.event_id).await? {
            if existing.processed {
                tracing::info!(event_id = %event.event_id, "webhook already processed");
                return Ok(ReconcileOutcome::AlreadyProcessed);
            }
        }
        self.webhook_events
            .insert_received(&WebhookEvent::received(&event.event_id, &event.event_type, stored, now))
            .await?;

        self.process(event, now).await
    }

    /// Reprocesses a stored delivery without signature verification.
    pub async fn replay(&self, event_id: &str) -> Result<ReconcileOutcome, WebhookError> {
        let stored = self
            .webhook_events
            .find(event_id)
            .await?
            .ok_or(WebhookError::EventNotFound)?;
        if stored.processed {
            return Ok(ReconcileOutcome::AlreadyProcessed);
        }
        let event: PaddleEvent =
            serde_json::from_value(stored.payload).map_err(|e| WebhookError::ParseError(e.to_string()))?;
        self.process(event, Timestamp::now()).await
    }

    async fn process(&self, event: PaddleEvent, now: Timestamp) -> Result<ReconcileOutcome, WebhookError> {
        let kind = event.kind();
        let result = match self.plan(&event, kind, now).await {
            Ok(plan) => self
                .ledger
                .commit(&event.event_id, &plan.changes, now)
                .await
                .map(|outcome| (outcome, plan.events))
                .map_err(WebhookError::from),
            Err(e) => Err(e),
        };

        match result {
            Ok((CommitOutcome::AlreadyProcessed, _)) => Ok(ReconcileOutcome::AlreadyProcessed),
            Ok((CommitOutcome::Applied, events)) => {
                publish_after_commit(self.publisher.as_ref(), events).await;
                tracing::info!(event_id = %event.event_id, event_type = %event.event_type, "webhook applied");
                Ok(if kind == PaddleEventKind::Other {
                    ReconcileOutcome::Acknowledged {
                        event_type: event.event_type,
                    }
                } else {
                    ReconcileOutcome::Applied {
                        event_type: event.event_type,
                    }
                })
            }
            Err(e) => {
                tracing::warn!(event_id = %event.event_id, event_type = %event.event_type, error = %e, "webhook processing failed");
                if let Err(mark) = self.webhook_events.mark_failed(&event.event_id, &e.to_string()).await {
                    tracing::error!(event_id = %event.event_id, error = %mark, "failed to record webhook error");
                }
                Err(e)
            }
        }
    }

    async fn plan(&self, event: &PaddleEvent, kind: PaddleEventKind, now: Timestamp) -> Result<Plan, WebhookError> {
        match kind {
            PaddleEventKind::SubscriptionCreated | PaddleEventKind::SubscriptionUpdated => {
                self.plan_subscription(event, SubscriptionStatus::Active, now, |_, _| {}).await
            }
            PaddleEventKind::SubscriptionCanceled => {
                self.plan_subscription(event, SubscriptionStatus::Cancelled, now, Subscription::cancel)
                    .await
            }
            PaddleEventKind::SubscriptionPastDue => {
                self.plan_subscription(event, SubscriptionStatus::PastDue, now, Subscription::mark_past_due)
                    .await
            }
            PaddleEventKind::SubscriptionPaused => {
                self.plan_subscription(event, SubscriptionStatus::Paused, now, Subscription::pause)
                    .await
            }
            PaddleEventKind::SubscriptionResumed => {
                self.plan_subscription(event, SubscriptionStatus::Active, now, Subscription::resume)
                    .await
            }
            PaddleEventKind::TransactionCompleted => {
                self.plan_transaction(event, PaymentStatus::Completed, now).await
            }
            PaddleEventKind::TransactionPaymentFailed => {
                self.plan_transaction(event, PaymentStatus::Failed, now).await
            }
            PaddleEventKind::Other => Ok(Plan::empty()),
        }
    }

    async fn plan_subscription(
        &self,
        event: &PaddleEvent,
        fallback_status: SubscriptionStatus,
        now: Timestamp,
        transition: impl FnOnce(&mut Subscription, Timestamp),
    ) -> Result<Plan, WebhookError> {
        let snapshot = SubscriptionSnapshot::from_data(&event.data, fallback_status)?;

        let mut subscription = match self
            .subscriptions
            .find_by_external_id(&snapshot.external_subscription_id)
            .await?
        {
            Some(existing) => existing,
            None => {
                let trainer = self
                    .resolve_trainer(
                        snapshot.external_customer_id.as_deref(),
                        snapshot.customer_email.as_deref(),
                    )
                    .await?
                    .ok_or_else(|| WebhookError::TrainerNotResolvable(snapshot.external_subscription_id.clone()))?;
                match self.subscriptions.find_by_trainer(trainer.id).await? {
                    Some(current) => current,
                    None => Subscription::free(trainer.id, now),
                }
            }
        };

        let plan = self.catalog.plan_for_price(snapshot.price_id.as_deref());
        subscription.apply_snapshot(&snapshot, plan, now);
        transition(&mut subscription, now);

        let mut changes = Vec::with_capacity(2);
        if let Some(customer_id) = &snapshot.external_customer_id {
            changes.push(BillingChange::LinkCustomer {
                trainer_id: subscription.trainer_id,
                customer_id: customer_id.clone(),
            });
        }
        changes.push(BillingChange::UpsertSubscription(subscription));
        Ok(Plan {
            changes,
            events: Vec::new(),
        })
    }

    async fn plan_transaction(&self, event: &PaddleEvent, status: PaymentStatus, now: Timestamp) -> Result<Plan, WebhookError> {
        let snapshot = TransactionSnapshot::from_data(&event.data)?;

        let subscription = match &snapshot.subscription_id {
            Some(external) => self.subscriptions.find_by_external_id(external).await?,
            None => None,
        };
        let trainer_id = match &subscription {
            Some(s) => s.trainer_id,
            None => self
                .resolve_trainer(snapshot.customer_id.as_deref(), None)
                .await?
                .map(|t| t.id)
                .ok_or_else(|| WebhookError::TrainerNotResolvable(snapshot.transaction_id.clone()))?,
        };

        let payment = Payment {
            id: PaymentId::new(),
            trainer_id,
            subscription_id: subscription.as_ref().map(|s| s.id),
            amount_cents: snapshot.amount_cents,
            currency: snapshot.currency.clone(),
            external_transaction_id: snapshot.transaction_id.clone(),
            status,
            created_at: now,
            updated_at: now,
        };
        let mut plan = Plan::empty();
        plan.changes.push(BillingChange::UpsertPayment(payment));

        match status {
            PaymentStatus::Failed => {
                if let Some(mut subscription) = subscription {
                    subscription.mark_past_due(now);
                    plan.changes.push(BillingChange::UpsertSubscription(subscription));
                }
            }
            PaymentStatus::Completed => {
                if let Some(trainer) = self.trainer(trainer_id).await? {
                    plan.events.push(TenantEvent::provider_payment_received(
                        &trainer,
                        snapshot.amount_cents,
                        &snapshot.currency,
                        now,
                    ));
                }
            }
            PaymentStatus::Pending | PaymentStatus::Refunded => {}
        }
        Ok(plan)
    }

    /// Customer id first, then the customer's email.
    async fn resolve_trainer(&self, customer_id: Option<&str>, email: Option<&str>) -> Result<Option<Trainer>, WebhookError> {
        if let Some(customer_id) = customer_id {
            if let Some(trainer) = self.trainers.find_by_billing_customer(customer_id).await? {
                return Ok(Some(trainer));
            }
        }
        if let Some(email) = email {
            if let Some(trainer) = self.trainers.find_by_email(email).await? {
                return Ok(Some(trainer));
            }
        }
        Ok(None)
    }

    async fn trainer(&self, trainer_id: TrainerId) -> Result<Option<Trainer>, WebhookError> {
        Ok(self.trainers.find_by_id(trainer_id).await?)
    }
}
