use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{db_error, dt, opt_dt, opt_ts, parse_column, ts, PostgresStore};
use crate::domain::foundation::{DomainError, NotificationId, Page, PageRequest, Timestamp, TrainerId};
use crate::domain::notification::{Channel, Notification, NotificationStatus};
use crate::ports::NotificationRepository;

#[derive(Debug, sqlx::FromRow)]
struct NotificationRow {
    id: Uuid,
    trainer_id: Uuid,
    channel: String,
    recipient: String,
    subject: Option<String>,
    message: String,
    status: String,
    provider_ref: Option<String>,
    sent_at: Option<DateTime<Utc>>,
    failed_reason: Option<String>,
    dedup_key: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<NotificationRow> for Notification {
    type Error = DomainError;

    fn try_from(row: NotificationRow) -> Result<Self, Self::Error> {
        Ok(Notification {
            id: NotificationId::from_uuid(row.id),
            trainer_id: TrainerId::from_uuid(row.trainer_id),
            channel: parse_column::<Channel>("channel", &row.channel)?,
            recipient: row.recipient,
            subject: row.subject,
            message: row.message,
            status: parse_column::<NotificationStatus>("status", &row.status)?,
            provider_ref: row.provider_ref,
            sent_at: opt_ts(row.sent_at),
            failed_reason: row.failed_reason,
            dedup_key: row.dedup_key,
            created_at: ts(row.created_at),
            updated_at: ts(row.updated_at),
        })
    }
}

const NOTIFICATION_COLUMNS: &str = "id, trainer_id, channel, recipient, subject, message, status, provider_ref, \
     sent_at, failed_reason, dedup_key, created_at, updated_at";

#[async_trait]
impl NotificationRepository for PostgresStore {
    async fn insert(&self, notification: &Notification) -> Result<(), DomainError> {
        sqlx::query(&format!(
            "INSERT INTO notifications ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
            NOTIFICATION_COLUMNS
        ))
        .bind(notification.id.as_uuid())
        .bind(notification.trainer_id.as_uuid())
        .bind(notification.channel.as_str())
        .bind(&notification.recipient)
        .bind(&notification.subject)
        .bind(&notification.message)
        .bind(notification.status.as_str())
        .bind(&notification.provider_ref)
        .bind(opt_dt(&notification.sent_at))
        .bind(&notification.failed_reason)
        .bind(&notification.dedup_key)
        .bind(dt(&notification.created_at))
        .bind(dt(&notification.updated_at))
        .execute(self.pool())
        .await
        .map_err(db_error("Failed to insert notification"))?;
        Ok(())
    }

    async fn update(&self, notification: &Notification) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE notifications SET
                status = $2, provider_ref = $3, sent_at = $4, failed_reason = $5, updated_at = $6
            WHERE id = $1
            "#,
        )
        .bind(notification.id.as_uuid())
        .bind(notification.status.as_str())
        .bind(&notification.provider_ref)
        .bind(opt_dt(&notification.sent_at))
        .bind(&notification.failed_reason)
        .bind(dt(&notification.updated_at))
        .execute(self.pool())
        .await
        .map_err(db_error("Failed to update notification"))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("Notification"));
        }
        Ok(())
    }

    async fn find_by_id(&self, id: NotificationId) -> Result<Option<Notification>, DomainError> {
        let sql = format!("SELECT {} FROM notifications WHERE id = $1", NOTIFICATION_COLUMNS);
        let row: Option<NotificationRow> = sqlx::query_as(&sql)
            .bind(id.as_uuid())
            .fetch_optional(self.pool())
            .await
            .map_err(db_error("Failed to find notification"))?;
        row.map(Notification::try_from).transpose()
    }

    async fn list(
        &self,
        trainer_id: TrainerId,
        channel: Option<Channel>,
        status: Option<NotificationStatus>,
        page: PageRequest,
    ) -> Result<Page<Notification>, DomainError> {
        let predicate = "trainer_id = $1 AND ($2::text IS NULL OR channel = $2) AND ($3::text IS NULL OR status = $3)";
        let channel = channel.map(|c| c.as_str());
        let status = status.map(|s| s.as_str());

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM notifications WHERE {}", predicate))
            .bind(trainer_id.as_uuid())
            .bind(channel)
            .bind(status)
            .fetch_one(self.pool())
            .await
            .map_err(db_error("Failed to count notifications"))?;

        let sql = format!(
            "SELECT {} FROM notifications WHERE {} ORDER BY created_at DESC OFFSET $4 LIMIT $5",
            NOTIFICATION_COLUMNS, predicate
        );
        let rows: Vec<NotificationRow> = sqlx::query_as(&sql)
            .bind(trainer_id.as_uuid())
            .bind(channel)
            .bind(status)
            .bind(i64::from(page.offset))
            .bind(i64::from(page.limit))
            .fetch_all(self.pool())
            .await
            .map_err(db_error("Failed to list notifications"))?;

        let items = rows.into_iter().map(Notification::try_from).collect::<Result<Vec<_>, _>>()?;
        Ok(Page::new(items, total.max(0) as u64, page))
    }

    async fn exists_sent_with_key(&self, trainer_id: TrainerId, dedup_key: &str) -> Result<bool, DomainError> {
        sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM notifications WHERE trainer_id = $1 AND dedup_key = $2 AND status = 'sent')",
        )
        .bind(trainer_id.as_uuid())
        .bind(dedup_key)
        .fetch_one(self.pool())
        .await
        .map_err(db_error("Failed to check notification dedup key"))
    }

    async fn requeue_failed(&self, now: Timestamp) -> Result<Vec<NotificationId>, DomainError> {
        let mut ids: Vec<Uuid> = sqlx::query_scalar(
            "UPDATE notifications SET status = 'pending', failed_reason = NULL, updated_at = $1 \
             WHERE status = 'failed' RETURNING id",
        )
        .bind(dt(&now))
        .fetch_all(self.pool())
        .await
        .map_err(db_error("Failed to requeue notifications"))?;
        ids.sort();
        Ok(ids.into_iter().map(NotificationId::from_uuid).collect())
    }
}
