use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use super::identity::upsert_subscription;
use super::{db_error, dt, opt_ts, parse_column, ts, PostgresStore};
use crate::domain::billing::{Payment, PaymentStatus, Subscription, SubscriptionStatus, WebhookEvent};
use crate::domain::entitlement::Plan;
use crate::domain::foundation::{
    DomainError, Page, PageRequest, PaymentId, SubscriptionId, Timestamp, TrainerId,
};
use crate::ports::{
    BillingChange, BillingLedger, CommitOutcome, SubscriptionRepository, WebhookEventRepository,
};

#[derive(Debug, sqlx::FromRow)]
struct SubscriptionRow {
    id: Uuid,
    trainer_id: Uuid,
    plan: String,
    status: String,
    current_period_start: Option<DateTime<Utc>>,
    current_period_end: Option<DateTime<Utc>>,
    cancel_at_period_end: bool,
    cancelled_at: Option<DateTime<Utc>>,
    external_subscription_id: Option<String>,
    external_customer_id: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SubscriptionRow> for Subscription {
    type Error = DomainError;

    fn try_from(row: SubscriptionRow) -> Result<Self, Self::Error> {
        Ok(Subscription {
            id: SubscriptionId::from_uuid(row.id),
            trainer_id: TrainerId::from_uuid(row.trainer_id),
            plan: parse_column::<Plan>("plan", &row.plan)?,
            status: parse_column::<SubscriptionStatus>("status", &row.status)?,
            current_period_start: opt_ts(row.current_period_start),
            current_period_end: opt_ts(row.current_period_end),
            cancel_at_period_end: row.cancel_at_period_end,
            cancelled_at: opt_ts(row.cancelled_at),
            external_subscription_id: row.external_subscription_id,
            external_customer_id: row.external_customer_id,
            created_at: ts(row.created_at),
            updated_at: ts(row.updated_at),
        })
    }
}

const SUBSCRIPTION_COLUMNS: &str = "id, trainer_id, plan, status, current_period_start, current_period_end, \
     cancel_at_period_end, cancelled_at, external_subscription_id, external_customer_id, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct PaymentRow {
    id: Uuid,
    trainer_id: Uuid,
    subscription_id: Option<Uuid>,
    amount_cents: i64,
    currency: String,
    external_transaction_id: String,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PaymentRow> for Payment {
    type Error = DomainError;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        Ok(Payment {
            id: PaymentId::from_uuid(row.id),
            trainer_id: TrainerId::from_uuid(row.trainer_id),
            subscription_id: row.subscription_id.map(SubscriptionId::from_uuid),
            amount_cents: row.amount_cents,
            currency: row.currency,
            external_transaction_id: row.external_transaction_id,
            status: parse_column::<PaymentStatus>("status", &row.status)?,
            created_at: ts(row.created_at),
            updated_at: ts(row.updated_at),
        })
    }
}

const PAYMENT_COLUMNS: &str = "id, trainer_id, subscription_id, amount_cents, currency, external_transaction_id, \
     status, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct WebhookEventRow {
    event_id: String,
    event_type: String,
    payload: JsonValue,
    processed: bool,
    processed_at: Option<DateTime<Utc>>,
    error_message: Option<String>,
    received_at: DateTime<Utc>,
}

impl From<WebhookEventRow> for WebhookEvent {
    fn from(row: WebhookEventRow) -> Self {
        WebhookEvent {
            event_id: row.event_id,
            event_type: row.event_type,
            payload: row.payload,
            processed: row.processed,
            processed_at: opt_ts(row.processed_at),
            error_message: row.error_message,
            received_at: ts(row.received_at),
        }
    }
}

const WEBHOOK_COLUMNS: &str = "event_id, event_type, payload, processed, processed_at, error_message, received_at";

#[async_trait]
impl SubscriptionRepository for PostgresStore {
    async fn find_by_trainer(&self, trainer_id: TrainerId) -> Result<Option<Subscription>, DomainError> {
        let sql = format!("SELECT {} FROM subscriptions WHERE trainer_id = $1", SUBSCRIPTION_COLUMNS);
        let row: Option<SubscriptionRow> = sqlx::query_as(&sql)
            .bind(trainer_id.as_uuid())
            .fetch_optional(self.pool())
            .await
            .map_err(db_error("Failed to find subscription"))?;
        row.map(Subscription::try_from).transpose()
    }

    async fn find_by_external_id(&self, external_subscription_id: &str) -> Result<Option<Subscription>, DomainError> {
        let sql = format!(
            "SELECT {} FROM subscriptions WHERE external_subscription_id = $1",
            SUBSCRIPTION_COLUMNS
        );
        let row: Option<SubscriptionRow> = sqlx::query_as(&sql)
            .bind(external_subscription_id)
            .fetch_optional(self.pool())
            .await
            .map_err(db_error("Failed to find subscription"))?;
        row.map(Subscription::try_from).transpose()
    }

    async fn save(&self, subscription: &Subscription) -> Result<(), DomainError> {
        let mut conn = self.pool().acquire().await.map_err(db_error("Failed to acquire connection"))?;
        upsert_subscription(&mut conn, subscription)
            .await
            .map_err(db_error("Failed to save subscription"))
    }
}

#[async_trait]
impl BillingLedger for PostgresStore {
    async fn commit(&self, event_id: &str, changes: &[BillingChange], now: Timestamp) -> Result<CommitOutcome, DomainError> {
        let mut tx = self.pool().begin().await.map_err(db_error("Failed to begin transaction"))?;

        let processed: Option<bool> =
            sqlx::query_scalar("SELECT processed FROM webhook_events WHERE event_id = $1 FOR UPDATE")
                .bind(event_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(db_error("Failed to lock webhook event"))?;
        match processed {
            Some(true) => return Ok(CommitOutcome::AlreadyProcessed),
            Some(false) => {}
            None => return Err(DomainError::not_found("Webhook event")),
        }

        for change in changes {
            match change {
                BillingChange::UpsertSubscription(subscription) => {
                    upsert_subscription(&mut tx, subscription)
                        .await
                        .map_err(db_error("Failed to upsert subscription"))?;
                }
                BillingChange::UpsertPayment(payment) => {
                    sqlx::query(
                        r#"
                        INSERT INTO payments (
                            id, trainer_id, subscription_id, amount_cents, currency,
                            external_transaction_id, status, created_at, updated_at
                        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                        ON CONFLICT (external_transaction_id) DO UPDATE SET
                            subscription_id = EXCLUDED.subscription_id,
                            amount_cents = EXCLUDED.amount_cents,
                            currency = EXCLUDED.currency,
                            status = EXCLUDED.status,
                            updated_at = EXCLUDED.updated_at
                        "#,
                    )
                    .bind(payment.id.as_uuid())
                    .bind(payment.trainer_id.as_uuid())
                    .bind(payment.subscription_id.map(|s| *s.as_uuid()))
                    .bind(payment.amount_cents)
                    .bind(&payment.currency)
                    .bind(&payment.external_transaction_id)
                    .bind(payment.status.as_str())
                    .bind(dt(&payment.created_at))
                    .bind(dt(&payment.updated_at))
                    .execute(&mut *tx)
                    .await
                    .map_err(db_error("Failed to upsert payment"))?;
                }
                BillingChange::LinkCustomer { trainer_id, customer_id } => {
                    sqlx::query("UPDATE trainers SET billing_customer_id = $2, updated_at = $3 WHERE id = $1")
                        .bind(trainer_id.as_uuid())
                        .bind(customer_id)
                        .bind(dt(&now))
                        .execute(&mut *tx)
                        .await
                        .map_err(db_error("Failed to link billing customer"))?;
                }
            }
        }

        sqlx::query(
            "UPDATE webhook_events SET processed = TRUE, processed_at = $2, error_message = NULL WHERE event_id = $1",
        )
        .bind(event_id)
        .bind(dt(&now))
        .execute(&mut *tx)
        .await
        .map_err(db_error("Failed to mark webhook processed"))?;

        tx.commit().await.map_err(db_error("Failed to commit webhook"))?;
        Ok(CommitOutcome::Applied)
    }

    async fn find_payment(&self, external_transaction_id: &str) -> Result<Option<Payment>, DomainError> {
        let sql = format!("SELECT {} FROM payments WHERE external_transaction_id = $1", PAYMENT_COLUMNS);
        let row: Option<PaymentRow> = sqlx::query_as(&sql)
            .bind(external_transaction_id)
            .fetch_optional(self.pool())
            .await
            .map_err(db_error("Failed to find payment"))?;
        row.map(Payment::try_from).transpose()
    }

    async fn list_payments(&self, trainer_id: TrainerId, page: PageRequest) -> Result<Page<Payment>, DomainError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM payments WHERE trainer_id = $1")
            .bind(trainer_id.as_uuid())
            .fetch_one(self.pool())
            .await
            .map_err(db_error("Failed to count payments"))?;

        let sql = format!(
            "SELECT {} FROM payments WHERE trainer_id = $1 ORDER BY created_at DESC OFFSET $2 LIMIT $3",
            PAYMENT_COLUMNS
        );
        let rows: Vec<PaymentRow> = sqlx::query_as(&sql)
            .bind(trainer_id.as_uuid())
            .bind(i64::from(page.offset))
            .bind(i64::from(page.limit))
            .fetch_all(self.pool())
            .await
            .map_err(db_error("Failed to list payments"))?;

        let items = rows.into_iter().map(Payment::try_from).collect::<Result<Vec<_>, _>>()?;
        Ok(Page::new(items, total.max(0) as u64, page))
    }
}

#[async_trait]
impl WebhookEventRepository for PostgresStore {
    async fn find(&self, event_id: &str) -> Result<Option<WebhookEvent>, DomainError> {
        let sql = format!("SELECT {} FROM webhook_events WHERE event_id = $1", WEBHOOK_COLUMNS);
        let row: Option<WebhookEventRow> = sqlx::query_as(&sql)
            .bind(event_id)
            .fetch_optional(self.pool())
            .await
            .map_err(db_error("Failed to find webhook event"))?;
        Ok(row.map(WebhookEvent::from))
    }

    async fn insert_received(&self, event: &WebhookEvent) -> Result<bool, DomainError> {
        let result = sqlx::query(
            r#"
            INSERT INTO webhook_events (event_id, event_type, payload, processed, processed_at, error_message, received_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (event_id) DO NOTHING
            "#,
        )
        .bind(&event.event_id)
        .bind(&event.event_type)
        .bind(&event.payload)
        .bind(event.processed)
        .bind(event.processed_at.as_ref().map(dt))
        .bind(&event.error_message)
        .bind(dt(&event.received_at))
        .execute(self.pool())
        .await
        .map_err(db_error("Failed to store webhook event"))?;
        Ok(result.rows_affected() == 1)
    }

    async fn mark_failed(&self, event_id: &str, error_message: &str) -> Result<(), DomainError> {
        sqlx::query("UPDATE webhook_events SET error_message = $2 WHERE event_id = $1")
            .bind(event_id)
            .bind(error_message)
            .execute(self.pool())
            .await
            .map_err(db_error("Failed to record webhook failure"))?;
        Ok(())
    }

    async fn list(&self, unprocessed_only: bool, page: PageRequest) -> Result<Page<WebhookEvent>, DomainError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM webhook_events WHERE (NOT $1 OR NOT processed)")
            .bind(unprocessed_only)
            .fetch_one(self.pool())
            .await
            .map_err(db_error("Failed to count webhook events"))?;

        let sql = format!(
            "SELECT {} FROM webhook_events WHERE (NOT $1 OR NOT processed) \
             ORDER BY received_at DESC OFFSET $2 LIMIT $3",
            WEBHOOK_COLUMNS
        );
        let rows: Vec<WebhookEventRow> = sqlx::query_as(&sql)
            .bind(unprocessed_only)
            .bind(i64::from(page.offset))
            .bind(i64::from(page.limit))
            .fetch_all(self.pool())
            .await
            .map_err(db_error("Failed to list webhook events"))?;

        Ok(Page::new(
            rows.into_iter().map(WebhookEvent::from).collect(),
            total.max(0) as u64,
            page,
        ))
    }

    async fn delete_processed_before(&self, cutoff: Timestamp) -> Result<u64, DomainError> {
        let result = sqlx::query("DELETE FROM webhook_events WHERE processed AND received_at < $1")
            .bind(dt(&cutoff))
            .execute(self.pool())
            .await
            .map_err(db_error("Failed to delete webhook events"))?;
        Ok(result.rows_affected())
    }
}
