//! Entitlement domain - plans, quotas and feature gates.

mod decision;
mod plan;
mod plan_limits;
mod resource;

pub use decision::{feature_not_included, quota_exceeded, QuotaCheck, Standing};
pub use plan::Plan;
pub use plan_limits::{required_plan_for_feature, required_plan_for_resource, PlanLimits};
pub use resource::{Feature, ResourceKind};

#[cfg(test)]
mod proptests {
    use super::plan_limits::limit_at_least;
    use super::*;
    use proptest::prelude::*;

    fn any_plan() -> impl Strategy<Value = Plan> {
        prop_oneof![Just(Plan::Free), Just(Plan::Pro), Just(Plan::Business)]
    }

    fn any_kind() -> impl Strategy<Value = ResourceKind> {
        prop_oneof![
            Just(ResourceKind::Clients),
            Just(ResourceKind::Pages),
            Just(ResourceKind::Workflows)
        ]
    }

    proptest! {
        #[test]
        fn allowance_is_monotone_in_plan(a in any_plan(), b in any_plan(), kind in any_kind(), count in 0u32..50) {
            let (lo, hi) = if a.rank() <= b.rank() { (a, b) } else { (b, a) };
            prop_assert!(limit_at_least(
                PlanLimits::for_plan(hi).limit_for(kind),
                PlanLimits::for_plan(lo).limit_for(kind)
            ));
            if QuotaCheck::evaluate(lo, kind, count).allowed {
                prop_assert!(QuotaCheck::evaluate(hi, kind, count).allowed);
            }
        }
    }
}
