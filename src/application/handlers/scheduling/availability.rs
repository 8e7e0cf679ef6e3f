//! ManageAvailabilityHandler - weekly rules and breaks.

use chrono::NaiveTime;
use std::sync::Arc;

use crate::application::handlers::entitlement::EntitlementGate;
use crate::domain::foundation::{AvailabilityRuleId, BreakId, DomainError, Timestamp};
use crate::domain::identity::TenantContext;
use crate::domain::scheduling::{AvailabilityRule, BreakPeriod};
use crate::ports::AvailabilityRepository;

/// Day 0 is Monday.
#[derive(Debug, Clone, Copy)]
pub struct RuleInput {
    pub day_of_week: u8,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

pub struct ManageAvailabilityHandler {
    availability: Arc<dyn AvailabilityRepository>,
    gate: EntitlementGate,
}

impl ManageAvailabilityHandler {
    pub fn new(availability: Arc<dyn AvailabilityRepository>, gate: EntitlementGate) -> Self {
        Self { availability, gate }
    }

    pub async fn list_rules(&self, ctx: &TenantContext) -> Result<Vec<AvailabilityRule>, DomainError> {
        self.availability.list_rules(ctx.trainer_id).await
    }

    pub async fn create_rule(&self, ctx: &TenantContext, input: RuleInput) -> Result<AvailabilityRule, DomainError> {
        self.gate.ensure_writable(ctx).await?;
        let rule = AvailabilityRule::new(
            ctx.trainer_id,
            input.day_of_week,
            input.start_time,
            input.end_time,
            Timestamp::now(),
        )?;
        self.availability.save_rule(&rule).await?;
        Ok(rule)
    }

    pub async fn update_rule(
        &self,
        ctx: &TenantContext,
        id: AvailabilityRuleId,
        input: RuleInput,
        is_active: bool,
    ) -> Result<AvailabilityRule, DomainError> {
        self.gate.ensure_writable(ctx).await?;
        let mut rule = self
            .availability
            .find_rule(ctx.trainer_id, id)
            .await?
            .ok_or_else(|| DomainError::not_found("availability rule"))?;
        rule.update(input.day_of_week, input.start_time, input.end_time, is_active, Timestamp::now())?;
        self.availability.save_rule(&rule).await?;
        Ok(rule)
    }

    pub async fn delete_rule(&self, ctx: &TenantContext, id: AvailabilityRuleId) -> Result<(), DomainError> {
        self.gate.ensure_writable(ctx).await?;
        if !self.availability.delete_rule(ctx.trainer_id, id).await? {
            return Err(DomainError::not_found("availability rule"));
        }
        Ok(())
    }

    pub async fn list_breaks(&self, ctx: &TenantContext) -> Result<Vec<BreakPeriod>, DomainError> {
        self.availability.list_breaks(ctx.trainer_id).await
    }

    pub async fn create_break(
        &self,
        ctx: &TenantContext,
        start: Timestamp,
        end: Timestamp,
        reason: Option<String>,
    ) -> Result<BreakPeriod, DomainError> {
        self.gate.ensure_writable(ctx).await?;
        let period = BreakPeriod::new(ctx.trainer_id, start, end, reason, Timestamp::now())?;
        self.availability.insert_break(&period).await?;
        Ok(period)
    }

    pub async fn delete_break(&self, ctx: &TenantContext, id: BreakId) -> Result<(), DomainError> {
        self.gate.ensure_writable(ctx).await?;
        if !self.availability.delete_break(ctx.trainer_id, id).await? {
            return Err(DomainError::not_found("break"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::test_support::{trainer_account, Fixture};
    use crate::domain::entitlement::Plan;
    use crate::domain::foundation::{ErrorCode, ErrorKind};

    fn t(h: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, 0, 0).unwrap()
    }

    fn monday(start: u32, end: u32) -> RuleInput {
        RuleInput {
            day_of_week: 0,
            start_time: t(start),
            end_time: t(end),
        }
    }

    #[tokio::test]
    async fn duplicate_rules_conflict() {
        let fx = Fixture::new(Plan::Free).await;
        let handler = ManageAvailabilityHandler::new(Arc::new(fx.store.clone()), fx.gate());

        handler.create_rule(&fx.ctx, monday(9, 12)).await.unwrap();
        let err = handler.create_rule(&fx.ctx, monday(9, 12)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Conflict);
        assert_eq!(handler.list_rules(&fx.ctx).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn inverted_rule_is_rejected() {
        let fx = Fixture::new(Plan::Free).await;
        let handler = ManageAvailabilityHandler::new(Arc::new(fx.store.clone()), fx.gate());
        let err = handler.create_rule(&fx.ctx, monday(12, 9)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn rules_are_tenant_scoped() {
        let fx = Fixture::new(Plan::Free).await;
        let (_, other) = trainer_account(&fx.store, "other@example.com", Plan::Free).await;
        let handler = ManageAvailabilityHandler::new(Arc::new(fx.store.clone()), fx.gate());

        let rule = handler.create_rule(&fx.ctx, monday(9, 12)).await.unwrap();
        let err = handler.update_rule(&other, rule.id, monday(10, 11), true).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
        assert_eq!(handler.delete_rule(&other, rule.id).await.unwrap_err().code, ErrorCode::NotFound);
        assert!(handler.list_rules(&other).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn breaks_round_trip() {
        let fx = Fixture::new(Plan::Free).await;
        let handler = ManageAvailabilityHandler::new(Arc::new(fx.store.clone()), fx.gate());
        let start = Timestamp::now().add_days(3);

        let period = handler
            .create_break(&fx.ctx, start, start.plus_minutes(120), Some("Holiday".into()))
            .await
            .unwrap();
        assert_eq!(handler.list_breaks(&fx.ctx).await.unwrap().len(), 1);
        handler.delete_break(&fx.ctx, period.id).await.unwrap();
        assert!(handler.list_breaks(&fx.ctx).await.unwrap().is_empty());
    }
}
