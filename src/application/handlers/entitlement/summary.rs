//! Subscription summary and plan listing.

use serde::Serialize;
use std::sync::Arc;

use super::EntitlementGate;
use crate::domain::billing::Subscription;
use crate::domain::entitlement::{Feature, Plan, PlanLimits, ResourceKind, Standing};
use crate::domain::foundation::DomainError;
use crate::domain::identity::TenantContext;
use crate::ports::{SubscriptionRepository, UsageReader};

#[derive(Debug, Clone, Serialize)]
pub struct UsageLine {
    pub resource_kind: ResourceKind,
    pub current: u32,
    pub limit: Option<u32>,
    pub allowed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct FeatureAccess {
    pub custom_domain: bool,
    pub white_label: bool,
    pub workflows: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionSummary {
    pub subscription: Option<Subscription>,
    pub standing: Standing,
    pub writable: bool,
    pub limits: PlanLimits,
    pub usage: Vec<UsageLine>,
    pub features: FeatureAccess,
}

pub struct GetSubscriptionSummaryHandler {
    subscriptions: Arc<dyn SubscriptionRepository>,
    usage: Arc<dyn UsageReader>,
}

impl GetSubscriptionSummaryHandler {
    pub fn new(subscriptions: Arc<dyn SubscriptionRepository>, usage: Arc<dyn UsageReader>) -> Self {
        Self { subscriptions, usage }
    }

    pub async fn handle(&self, ctx: &TenantContext) -> Result<SubscriptionSummary, DomainError> {
        let subscription = self.subscriptions.find_by_trainer(ctx.trainer_id).await?;
        let standing = Standing::from_subscription(subscription.as_ref());
        let gate = EntitlementGate::new(self.subscriptions.clone(), self.usage.clone());

        let mut usage = Vec::with_capacity(ResourceKind::ALL.len());
        for kind in ResourceKind::ALL {
            let check = gate.may_create(ctx.trainer_id, kind).await?;
            usage.push(UsageLine {
                resource_kind: kind,
                current: check.current,
                limit: check.limit,
                allowed: check.allowed,
            });
        }

        let limits = standing.limits();
        Ok(SubscriptionSummary {
            subscription,
            writable: standing.allows_writes(),
            features: FeatureAccess {
                custom_domain: limits.includes(Feature::CustomDomain),
                white_label: limits.includes(Feature::WhiteLabel),
                workflows: limits.includes(Feature::Workflows),
            },
            standing,
            limits,
            usage,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanOffer {
    pub plan: Plan,
    pub display_name: &'static str,
    pub is_paid: bool,
    pub limits: PlanLimits,
}

/// The plan matrix, cheapest first.
pub fn list_plans() -> Vec<PlanOffer> {
    Plan::ALL
        .into_iter()
        .map(|plan| PlanOffer {
            plan,
            display_name: plan.display_name(),
            is_paid: plan.is_paid(),
            limits: PlanLimits::for_plan(plan),
        })
        .collect()
}
