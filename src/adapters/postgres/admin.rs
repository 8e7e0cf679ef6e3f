use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use sqlx::types::Json;
use std::collections::BTreeMap;
use uuid::Uuid;

use super::identity::{TrainerRow, TRAINER_COLUMNS};
use super::quota::usage_sql;
use super::{count_u32, db_error, dt, parse_column, ts, PostgresStore};
use crate::domain::admin::{AdminAction, AdminActionKind};
use crate::domain::billing::SubscriptionStatus;
use crate::domain::entitlement::{Plan, ResourceKind};
use crate::domain::foundation::{AdminActionId, DomainError, Page, PageRequest, PrincipalId, TrainerId};
use crate::domain::identity::Trainer;
use crate::ports::{AccountFlags, AdminRepository, TrainerOverview, UsageReader};

#[derive(Debug, sqlx::FromRow)]
struct AdminActionRow {
    id: Uuid,
    admin_id: Uuid,
    kind: String,
    target_trainer_id: Option<Uuid>,
    details: Json<BTreeMap<String, JsonValue>>,
    client_ip: Option<String>,
    user_agent: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<AdminActionRow> for AdminAction {
    type Error = DomainError;

    fn try_from(row: AdminActionRow) -> Result<Self, Self::Error> {
        Ok(AdminAction {
            id: AdminActionId::from_uuid(row.id),
            admin_id: PrincipalId::from_uuid(row.admin_id),
            kind: parse_column::<AdminActionKind>("kind", &row.kind)?,
            target_trainer_id: row.target_trainer_id.map(TrainerId::from_uuid),
            details: row.details.0,
            client_ip: row.client_ip,
            user_agent: row.user_agent,
            created_at: ts(row.created_at),
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OverviewRow {
    #[sqlx(flatten)]
    trainer: TrainerRow,
    email: String,
    principal_active: bool,
    plan: Option<String>,
    subscription_status: Option<String>,
}

impl TryFrom<OverviewRow> for TrainerOverview {
    type Error = DomainError;

    fn try_from(row: OverviewRow) -> Result<Self, Self::Error> {
        Ok(TrainerOverview {
            trainer: Trainer::try_from(row.trainer)?,
            email: row.email,
            is_active: row.principal_active,
            plan: match row.plan {
                Some(raw) => parse_column::<Plan>("plan", &raw)?,
                None => Plan::Free,
            },
            subscription_status: match row.subscription_status {
                Some(raw) => parse_column::<SubscriptionStatus>("status", &raw)?,
                None => SubscriptionStatus::Active,
            },
        })
    }
}

/// Tenant-owned tables, children before parents.
const TENANT_TABLES: [&str; 14] = [
    "notifications",
    "workflow_executions",
    "workflows",
    "message_templates",
    "pages",
    "manual_payments",
    "package_purchases",
    "packages",
    "bookings",
    "clients",
    "break_periods",
    "availability_rules",
    "payments",
    "subscriptions",
];

#[async_trait]
impl AdminRepository for PostgresStore {
    async fn append_action(&self, action: &AdminAction) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO admin_actions (id, admin_id, kind, target_trainer_id, details, client_ip, user_agent, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(action.id.as_uuid())
        .bind(action.admin_id.as_uuid())
        .bind(action.kind.as_str())
        .bind(action.target_trainer_id.map(|t| *t.as_uuid()))
        .bind(Json(&action.details))
        .bind(&action.client_ip)
        .bind(&action.user_agent)
        .bind(dt(&action.created_at))
        .execute(self.pool())
        .await
        .map_err(db_error("Failed to record admin action"))?;
        Ok(())
    }

    async fn list_actions(&self, page: PageRequest) -> Result<Page<AdminAction>, DomainError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM admin_actions")
            .fetch_one(self.pool())
            .await
            .map_err(db_error("Failed to count admin actions"))?;

        let rows: Vec<AdminActionRow> = sqlx::query_as(
            r#"
            SELECT id, admin_id, kind, target_trainer_id, details, client_ip, user_agent, created_at
            FROM admin_actions ORDER BY created_at DESC OFFSET $1 LIMIT $2
            "#,
        )
        .bind(i64::from(page.offset))
        .bind(i64::from(page.limit))
        .fetch_all(self.pool())
        .await
        .map_err(db_error("Failed to list admin actions"))?;

        let items = rows.into_iter().map(AdminAction::try_from).collect::<Result<Vec<_>, _>>()?;
        Ok(Page::new(items, total.max(0) as u64, page))
    }

    async fn search_trainers(&self, search: Option<&str>, page: PageRequest) -> Result<Page<TrainerOverview>, DomainError> {
        let pattern = search
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(|t| format!("%{}%", t.to_lowercase()));
        let from = "FROM trainers t \
             JOIN principals p ON p.id = t.principal_id \
             LEFT JOIN subscriptions s ON s.trainer_id = t.id \
             WHERE ($1::text IS NULL OR LOWER(t.business_name) LIKE $1 OR p.email LIKE $1)";

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) {}", from))
            .bind(&pattern)
            .fetch_one(self.pool())
            .await
            .map_err(db_error("Failed to count trainers"))?;

        let sql = format!(
            "SELECT {}, p.email, p.is_active AS principal_active, s.plan, s.status AS subscription_status {} \
             ORDER BY t.created_at DESC OFFSET $2 LIMIT $3",
            TRAINER_COLUMNS, from
        );
        let rows: Vec<OverviewRow> = sqlx::query_as(&sql)
            .bind(&pattern)
            .bind(i64::from(page.offset))
            .bind(i64::from(page.limit))
            .fetch_all(self.pool())
            .await
            .map_err(db_error("Failed to search trainers"))?;

        let items = rows.into_iter().map(TrainerOverview::try_from).collect::<Result<Vec<_>, _>>()?;
        Ok(Page::new(items, total.max(0) as u64, page))
    }

    async fn set_account_flags(&self, trainer_id: TrainerId, flags: AccountFlags) -> Result<bool, DomainError> {
        let mut tx = self.pool().begin().await.map_err(db_error("Failed to begin transaction"))?;

        let principal_id: Option<Uuid> = sqlx::query_scalar(
            "UPDATE trainers SET is_verified = COALESCE($2, is_verified) WHERE id = $1 RETURNING principal_id",
        )
        .bind(trainer_id.as_uuid())
        .bind(flags.is_verified)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error("Failed to update trainer flags"))?;
        let Some(principal_id) = principal_id else {
            return Ok(false);
        };

        sqlx::query(
            "UPDATE principals SET is_active = COALESCE($2, is_active), is_verified = COALESCE($3, is_verified) \
             WHERE id = $1",
        )
        .bind(principal_id)
        .bind(flags.is_active)
        .bind(flags.is_verified)
        .execute(&mut *tx)
        .await
        .map_err(db_error("Failed to update account flags"))?;

        tx.commit().await.map_err(db_error("Failed to commit account flags"))?;
        Ok(true)
    }

    async fn delete_tenant(&self, trainer_id: TrainerId) -> Result<bool, DomainError> {
        let mut tx = self.pool().begin().await.map_err(db_error("Failed to begin transaction"))?;

        let principal_id: Option<Uuid> =
            sqlx::query_scalar("SELECT principal_id FROM trainers WHERE id = $1 FOR UPDATE")
                .bind(trainer_id.as_uuid())
                .fetch_optional(&mut *tx)
                .await
                .map_err(db_error("Failed to lock trainer"))?;
        let Some(principal_id) = principal_id else {
            return Ok(false);
        };

        for table in TENANT_TABLES {
            sqlx::query(&format!("DELETE FROM {} WHERE trainer_id = $1", table))
                .bind(trainer_id.as_uuid())
                .execute(&mut *tx)
                .await
                .map_err(db_error("Failed to delete tenant rows"))?;
        }
        sqlx::query("DELETE FROM trainers WHERE id = $1")
            .bind(trainer_id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(db_error("Failed to delete trainer"))?;
        sqlx::query("DELETE FROM auth_tokens WHERE principal_id = $1")
            .bind(principal_id)
            .execute(&mut *tx)
            .await
            .map_err(db_error("Failed to delete tokens"))?;
        sqlx::query("DELETE FROM principals WHERE id = $1")
            .bind(principal_id)
            .execute(&mut *tx)
            .await
            .map_err(db_error("Failed to delete principal"))?;

        tx.commit().await.map_err(db_error("Failed to commit tenant deletion"))?;
        Ok(true)
    }
}

#[async_trait]
impl UsageReader for PostgresStore {
    async fn count(&self, trainer_id: TrainerId, kind: ResourceKind) -> Result<u32, DomainError> {
        let count: i64 = sqlx::query_scalar(usage_sql(kind))
            .bind(trainer_id.as_uuid())
            .fetch_one(self.pool())
            .await
            .map_err(db_error("Failed to count usage"))?;
        Ok(count_u32(count))
    }
}
