//! Entitlement decisions: quota checks, feature gates and write standing.

use serde::Serialize;

use super::plan_limits::{required_plan_for_feature, required_plan_for_resource};
use super::{Feature, Plan, PlanLimits, ResourceKind};
use crate::domain::billing::{Subscription, SubscriptionStatus};
use crate::domain::foundation::{DomainError, ErrorCode};

/// The parts of a subscription that drive entitlement decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Standing {
    pub plan: Plan,
    pub status: SubscriptionStatus,
    pub cancel_at_period_end: bool,
}

impl Standing {
    /// Standing of a trainer without a subscription row: free and active.
    pub fn default_free() -> Self {
        Self {
            plan: Plan::Free,
            status: SubscriptionStatus::Active,
            cancel_at_period_end: false,
        }
    }

    pub fn from_subscription(subscription: Option<&Subscription>) -> Self {
        subscription
            .map(|s| Self {
                plan: s.plan,
                status: s.status,
                cancel_at_period_end: s.cancel_at_period_end,
            })
            .unwrap_or_else(Self::default_free)
    }

    /// Whether non-billing writes are permitted.
    ///
    /// Cancelled subscriptions, and past-due subscriptions scheduled to
    /// cancel, lose write access.
    pub fn allows_writes(&self) -> bool {
        match self.status {
            SubscriptionStatus::Cancelled => false,
            SubscriptionStatus::PastDue => !self.cancel_at_period_end,
            _ => true,
        }
    }

    pub fn limits(&self) -> PlanLimits {
        PlanLimits::for_plan(self.plan)
    }

    /// Returns an error when writes are not permitted.
    pub fn ensure_writable(&self) -> Result<(), DomainError> {
        if self.allows_writes() {
            Ok(())
        } else {
            Err(DomainError::new(
                ErrorCode::SubscriptionInactive,
                "Your subscription is not active; update billing to make changes",
            )
            .with_detail("status", self.status.as_str()))
        }
    }
}

/// Outcome of `may_create`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuotaCheck {
    pub resource_kind: ResourceKind,
    pub allowed: bool,
    pub current: u32,
    /// None = unlimited.
    pub limit: Option<u32>,
    /// Cheapest plan that raises the limit, when denied.
    pub required_plan: Option<Plan>,
}

impl QuotaCheck {
    /// Evaluates a quota from the plan and the live count.
    pub fn evaluate(plan: Plan, kind: ResourceKind, current: u32) -> Self {
        let limits = PlanLimits::for_plan(plan);
        let allowed = !limits.limit_reached(kind, current);
        Self {
            resource_kind: kind,
            allowed,
            current,
            limit: limits.limit_for(kind),
            required_plan: if allowed {
                None
            } else {
                required_plan_for_resource(plan, kind)
            },
        }
    }

    /// Converts a denial into the error surfaced to callers.
    pub fn into_result(self) -> Result<(), DomainError> {
        if self.allowed {
            Ok(())
        } else {
            Err(quota_exceeded(self.resource_kind, self.current, self.limit, self.required_plan))
        }
    }
}

/// Builds the quota error with its structured details.
pub fn quota_exceeded(
    kind: ResourceKind,
    current: u32,
    limit: Option<u32>,
    required_plan: Option<Plan>,
) -> DomainError {
    let message = match limit {
        Some(limit) => format!(
            "You have reached your plan limit of {} {}",
            limit,
            kind.as_str()
        ),
        None => format!("Your plan does not allow more {}", kind.as_str()),
    };
    let mut err = DomainError::new(ErrorCode::QuotaExceeded, message)
        .with_detail("resource_kind", kind.as_str())
        .with_detail("current", current);
    err = match limit {
        Some(l) => err.with_detail("limit", l),
        None => err.with_detail("limit", serde_json::Value::Null),
    };
    match required_plan {
        Some(p) => err.with_detail("required_plan", p.as_str()),
        None => err,
    }
}

/// Builds the error for a feature the current plan does not include.
pub fn feature_not_included(feature: Feature) -> DomainError {
    let plan = required_plan_for_feature(feature);
    DomainError::new(
        ErrorCode::FeatureNotIncluded,
        format!(
            "The {} feature requires the {} plan",
            feature.as_str(),
            plan.display_name()
        ),
    )
    .with_detail("feature", feature.as_str())
    .with_detail("required_plan", plan.as_str())
}
