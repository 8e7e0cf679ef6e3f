//! Quota recount under the subscription row lock.

use sqlx::{Postgres, Transaction};

use super::{count_u32, db_error, parse_column};
use crate::domain::entitlement::{Plan, QuotaCheck, ResourceKind};
use crate::domain::foundation::{DomainError, TrainerId};
use crate::ports::QuotaWrite;

pub(super) fn usage_sql(kind: ResourceKind) -> &'static str {
    match kind {
        ResourceKind::Clients => "SELECT COUNT(*) FROM clients WHERE trainer_id = $1 AND is_active",
        ResourceKind::Pages => "SELECT COUNT(*) FROM pages WHERE trainer_id = $1",
        ResourceKind::Workflows => "SELECT COUNT(*) FROM workflows WHERE trainer_id = $1 AND is_active",
    }
}

/// Locks the trainer's subscription row and decides whether one more unit
/// of `kind` fits. The lock is held until the transaction ends.
pub(super) async fn check_quota(
    tx: &mut Transaction<'_, Postgres>,
    trainer_id: TrainerId,
    kind: ResourceKind,
    enforce: bool,
) -> Result<QuotaWrite, DomainError> {
    if !enforce {
        return Ok(QuotaWrite::Written);
    }

    let plan: Option<String> = sqlx::query_scalar("SELECT plan FROM subscriptions WHERE trainer_id = $1 FOR UPDATE")
        .bind(trainer_id.as_uuid())
        .fetch_optional(&mut **tx)
        .await
        .map_err(db_error("Failed to lock subscription"))?;
    let plan = match plan {
        Some(raw) => parse_column::<Plan>("plan", &raw)?,
        None => Plan::Free,
    };

    let current: i64 = sqlx::query_scalar(usage_sql(kind))
        .bind(trainer_id.as_uuid())
        .fetch_one(&mut **tx)
        .await
        .map_err(db_error("Failed to count usage"))?;

    let check = QuotaCheck::evaluate(plan, kind, count_u32(current));
    Ok(if check.allowed {
        QuotaWrite::Written
    } else {
        QuotaWrite::Denied(check)
    })
}
