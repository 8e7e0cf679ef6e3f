//! Entitlement handlers.
//!
//! - `EntitlementGate` - write standing, quota pre-checks and feature gates
//! - `GetSubscriptionSummaryHandler` - plan, status, usage and features
//! - `list_plans` - the public plan matrix

mod gate;
mod summary;

pub use gate::EntitlementGate;
pub use summary::{
    list_plans, FeatureAccess, GetSubscriptionSummaryHandler, PlanOffer, SubscriptionSummary,
    UsageLine,
};
