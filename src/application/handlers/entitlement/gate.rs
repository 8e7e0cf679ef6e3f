//! EntitlementGate - decides what a tenant may create and use.
//!
//! Usage is counted live on every call. The pre-checks here give callers
//! an early, descriptive error; the store re-checks quota-bearing inserts
//! under a lock on the subscription row, so a race between two creates
//! cannot overshoot the limit.

use std::sync::Arc;

use crate::domain::entitlement::{feature_not_included, Feature, QuotaCheck, ResourceKind, Standing};
use crate::domain::foundation::{DomainError, TrainerId};
use crate::domain::identity::TenantContext;
use crate::ports::{SubscriptionRepository, UsageReader};

#[derive(Clone)]
pub struct EntitlementGate {
    subscriptions: Arc<dyn SubscriptionRepository>,
    usage: Arc<dyn UsageReader>,
}

impl EntitlementGate {
    pub fn new(subscriptions: Arc<dyn SubscriptionRepository>, usage: Arc<dyn UsageReader>) -> Self {
        Self { subscriptions, usage }
    }

    /// Missing subscription reads as free/active.
    pub async fn standing(&self, trainer_id: TrainerId) -> Result<Standing, DomainError> {
        let subscription = self.subscriptions.find_by_trainer(trainer_id).await?;
        Ok(Standing::from_subscription(subscription.as_ref()))
    }

    /// Rejects non-billing writes for inactive subscriptions.
    pub async fn ensure_writable(&self, ctx: &TenantContext) -> Result<(), DomainError> {
        if ctx.bypasses_entitlements() {
            return Ok(());
        }
        self.standing(ctx.trainer_id).await?.ensure_writable()
    }

    /// `may_create`: live count against the plan limit.
    pub async fn may_create(&self, trainer_id: TrainerId, kind: ResourceKind) -> Result<QuotaCheck, DomainError> {
        let standing = self.standing(trainer_id).await?;
        let current = self.usage.count(trainer_id, kind).await?;
        Ok(QuotaCheck::evaluate(standing.plan, kind, current))
    }

    /// `may_access` for plan features.
    pub async fn may_access(&self, trainer_id: TrainerId, feature: Feature) -> Result<bool, DomainError> {
        Ok(self.standing(trainer_id).await?.limits().includes(feature))
    }

    pub async fn require_feature(&self, ctx: &TenantContext, feature: Feature) -> Result<(), DomainError> {
        if ctx.bypasses_entitlements() || self.may_access(ctx.trainer_id, feature).await? {
            Ok(())
        } else {
            Err(feature_not_included(feature))
        }
    }

    /// Writable standing plus room for one more `kind`.
    pub async fn check_create(&self, ctx: &TenantContext, kind: ResourceKind) -> Result<(), DomainError> {
        self.ensure_writable(ctx).await?;
        if ctx.bypasses_entitlements() {
            return Ok(());
        }
        self.may_create(ctx.trainer_id, kind).await?.into_result()
    }

    /// Whether the store should re-check quota on insert.
    pub fn enforces_quota(&self, ctx: &TenantContext) -> bool {
        !ctx.bypasses_entitlements()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryStore;
    use crate::domain::billing::{Subscription, SubscriptionStatus};
    use crate::domain::entitlement::Plan;
    use crate::domain::foundation::{ErrorCode, PrincipalId, Timestamp};
    use crate::ports::SubscriptionRepository;
    use chrono_tz::Tz;

    fn setup() -> (InMemoryStore, EntitlementGate, TenantContext) {
        let store = InMemoryStore::new();
        let gate = EntitlementGate::new(Arc::new(store.clone()), Arc::new(store.clone()));
        let ctx = TenantContext::new(PrincipalId::new(), TrainerId::new(), Tz::UTC);
        (store, gate, ctx)
    }

    #[tokio::test]
    async fn missing_subscription_is_free_and_writable() {
        let (_, gate, ctx) = setup();
        assert_eq!(gate.standing(ctx.trainer_id).await.unwrap().plan, Plan::Free);
        gate.ensure_writable(&ctx).await.unwrap();
        let check = gate.may_create(ctx.trainer_id, ResourceKind::Clients).await.unwrap();
        assert!(check.allowed);
        assert_eq!(check.limit, Some(10));
    }

    #[tokio::test]
    async fn free_plan_has_no_workflows_feature() {
        let (_, gate, ctx) = setup();
        let err = gate.require_feature(&ctx, Feature::Workflows).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::FeatureNotIncluded);

        let mut admin = ctx;
        admin.is_superuser = true;
        gate.require_feature(&admin, Feature::Workflows).await.unwrap();
    }

    #[tokio::test]
    async fn cancelled_subscription_blocks_writes() {
        let (store, gate, ctx) = setup();
        let mut subscription = Subscription::free(ctx.trainer_id, Timestamp::now());
        subscription.cancel(Timestamp::now());
        SubscriptionRepository::save(&store, &subscription).await.unwrap();

        let err = gate.check_create(&ctx, ResourceKind::Clients).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::SubscriptionInactive);
        assert_eq!(
            gate.standing(ctx.trainer_id).await.unwrap().status,
            SubscriptionStatus::Cancelled
        );
    }
}
