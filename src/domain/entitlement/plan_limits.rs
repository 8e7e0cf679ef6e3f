//! Plan-based limits and feature matrix.

use serde::{Deserialize, Serialize};

use super::{Feature, Plan, ResourceKind};

/// Usage limits and feature flags for a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanLimits {
    pub plan: Plan,
    /// Maximum active clients. None = unlimited.
    pub max_clients: Option<u32>,
    /// Maximum pages. None = unlimited.
    pub max_pages: Option<u32>,
    /// Maximum active workflows. None = unlimited.
    pub max_workflows: Option<u32>,
    pub custom_domain: bool,
    pub white_label: bool,
}

impl PlanLimits {
    /// Get the limits for a plan.
    ///
    /// | Plan | Clients | Pages | Workflows | Custom domain | White-label |
    /// |------|---------|-------|-----------|---------------|-------------|
    /// | Free | 10 | 1 | 0 | No | No |
    /// | Pro | Unlimited | 5 | 3 | No | No |
    /// | Business | Unlimited | Unlimited | Unlimited | Yes | Yes |
    pub fn for_plan(plan: Plan) -> Self {
        match plan {
            Plan::Free => Self {
                plan,
                max_clients: Some(10),
                max_pages: Some(1),
                max_workflows: Some(0),
                custom_domain: false,
                white_label: false,
            },
            Plan::Pro => Self {
                plan,
                max_clients: None,
                max_pages: Some(5),
                max_workflows: Some(3),
                custom_domain: false,
                white_label: false,
            },
            Plan::Business => Self {
                plan,
                max_clients: None,
                max_pages: None,
                max_workflows: None,
                custom_domain: true,
                white_label: true,
            },
        }
    }

    /// Limit for a resource kind. None = unlimited.
    pub fn limit_for(&self, kind: ResourceKind) -> Option<u32> {
        match kind {
            ResourceKind::Clients => self.max_clients,
            ResourceKind::Pages => self.max_pages,
            ResourceKind::Workflows => self.max_workflows,
        }
    }

    /// Whether the plan includes a feature.
    pub fn includes(&self, feature: Feature) -> bool {
        match feature {
            Feature::CustomDomain => self.custom_domain,
            Feature::WhiteLabel => self.white_label,
            Feature::Workflows => self.max_workflows != Some(0),
        }
    }

    /// Check if the limit for a resource has been reached.
    ///
    /// Returns false if unlimited or under limit.
    pub fn limit_reached(&self, kind: ResourceKind, current: u32) -> bool {
        self.limit_for(kind).map(|max| current >= max).unwrap_or(false)
    }
}

/// Cheapest plan that includes the feature.
pub fn required_plan_for_feature(feature: Feature) -> Plan {
    Plan::ALL
        .into_iter()
        .find(|p| PlanLimits::for_plan(*p).includes(feature))
        .unwrap_or(Plan::Business)
}

/// Cheapest plan above `current` whose limit for `kind` is larger.
///
/// None when no plan offers more.
pub fn required_plan_for_resource(current: Plan, kind: ResourceKind) -> Option<Plan> {
    let current_limit = PlanLimits::for_plan(current).limit_for(kind)?;
    current.upgrades().find(|p| {
        PlanLimits::for_plan(*p)
            .limit_for(kind)
            .map(|l| l > current_limit)
            .unwrap_or(true)
    })
}

/// Compares two optional limits where None means unlimited.
pub(crate) fn limit_at_least(a: Option<u32>, b: Option<u32>) -> bool {
    match (a, b) {
        (None, _) => true,
        (Some(_), None) => false,
        (Some(a), Some(b)) => a >= b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_plan_matrix() {
        let limits = PlanLimits::for_plan(Plan::Free);
        assert_eq!(limits.max_clients, Some(10));
        assert_eq!(limits.max_pages, Some(1));
        assert_eq!(limits.max_workflows, Some(0));
        assert!(!limits.includes(Feature::Workflows));
        assert!(!limits.includes(Feature::CustomDomain));
    }

    #[test]
    fn pro_plan_matrix() {
        let limits = PlanLimits::for_plan(Plan::Pro);
        assert_eq!(limits.max_clients, None);
        assert_eq!(limits.max_pages, Some(5));
        assert_eq!(limits.max_workflows, Some(3));
        assert!(limits.includes(Feature::Workflows));
        assert!(!limits.includes(Feature::WhiteLabel));
    }

    #[test]
    fn business_plan_is_unlimited() {
        let limits = PlanLimits::for_plan(Plan::Business);
        for kind in ResourceKind::ALL {
            assert_eq!(limits.limit_for(kind), None);
        }
        assert!(limits.includes(Feature::CustomDomain));
        assert!(limits.includes(Feature::WhiteLabel));
    }

    #[test]
    fn limit_reached_at_boundary() {
        let limits = PlanLimits::for_plan(Plan::Free);
        assert!(!limits.limit_reached(ResourceKind::Clients, 9));
        assert!(limits.limit_reached(ResourceKind::Clients, 10));
        assert!(!PlanLimits::for_plan(Plan::Pro).limit_reached(ResourceKind::Clients, 10_000));
    }

    #[test]
    fn required_plans() {
        assert_eq!(required_plan_for_feature(Feature::CustomDomain), Plan::Business);
        assert_eq!(required_plan_for_feature(Feature::WhiteLabel), Plan::Business);
        assert_eq!(required_plan_for_feature(Feature::Workflows), Plan::Pro);
        assert_eq!(required_plan_for_resource(Plan::Free, ResourceKind::Clients), Some(Plan::Pro));
        assert_eq!(required_plan_for_resource(Plan::Pro, ResourceKind::Pages), Some(Plan::Business));
        assert_eq!(required_plan_for_resource(Plan::Business, ResourceKind::Pages), None);
    }

    #[test]
    fn upgrading_never_reduces_allowances() {
        for (i, lower) in Plan::ALL.iter().enumerate() {
            for higher in &Plan::ALL[i..] {
                let lo = PlanLimits::for_plan(*lower);
                let hi = PlanLimits::for_plan(*higher);
                for kind in ResourceKind::ALL {
                    assert!(limit_at_least(hi.limit_for(kind), lo.limit_for(kind)));
                }
                for feature in [Feature::CustomDomain, Feature::WhiteLabel, Feature::Workflows] {
                    assert!(!lo.includes(feature) || hi.includes(feature));
                }
            }
        }
    }
}
