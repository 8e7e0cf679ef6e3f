//! Subscription aggregate.

use serde::{Deserialize, Serialize};

use super::{SubscriptionSnapshot, SubscriptionStatus};
use crate::domain::entitlement::Plan;
use crate::domain::foundation::{SubscriptionId, Timestamp, TrainerId};

/// A trainer's subscription. One per trainer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub trainer_id: TrainerId,
    pub plan: Plan,
    pub status: SubscriptionStatus,
    pub current_period_start: Option<Timestamp>,
    pub current_period_end: Option<Timestamp>,
    pub cancel_at_period_end: bool,
    pub cancelled_at: Option<Timestamp>,
    pub external_subscription_id: Option<String>,
    pub external_customer_id: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Subscription {
    /// Default subscription every trainer starts with.
    pub fn free(trainer_id: TrainerId, now: Timestamp) -> Self {
        Self {
            id: SubscriptionId::new(),
            trainer_id,
            plan: Plan::Free,
            status: SubscriptionStatus::Active,
            current_period_start: None,
            current_period_end: None,
            cancel_at_period_end: false,
            cancelled_at: None,
            external_subscription_id: None,
            external_customer_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrites provider-owned fields from a subscription payload.
    pub fn apply_snapshot(&mut self, snapshot: &SubscriptionSnapshot, plan: Plan, now: Timestamp) {
        self.plan = plan;
        self.status = snapshot.status;
        self.external_subscription_id = Some(snapshot.external_subscription_id.clone());
        if let Some(customer) = &snapshot.external_customer_id {
            self.external_customer_id = Some(customer.clone());
        }
        if snapshot.current_period_start.is_some() {
            self.current_period_start = snapshot.current_period_start;
        }
        if snapshot.current_period_end.is_some() {
            self.current_period_end = snapshot.current_period_end;
        }
        self.cancel_at_period_end = snapshot.cancel_at_period_end;
        if snapshot.status == SubscriptionStatus::Cancelled && self.cancelled_at.is_none() {
            self.cancelled_at = Some(now);
        }
        self.updated_at = now;
    }

    pub fn cancel(&mut self, now: Timestamp) {
        self.status = SubscriptionStatus::Cancelled;
        self.cancelled_at = Some(now);
        self.updated_at = now;
    }

    pub fn mark_past_due(&mut self, now: Timestamp) {
        self.status = SubscriptionStatus::PastDue;
        self.updated_at = now;
    }

    pub fn pause(&mut self, now: Timestamp) {
        self.status = SubscriptionStatus::Paused;
        self.updated_at = now;
    }

    pub fn resume(&mut self, now: Timestamp) {
        self.status = SubscriptionStatus::Active;
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(status: SubscriptionStatus) -> SubscriptionSnapshot {
        SubscriptionSnapshot {
            external_subscription_id: "sub_1".into(),
            external_customer_id: Some("ctm_1".into()),
            status,
            price_id: Some("pri_pro_monthly".into()),
            current_period_start: None,
            current_period_end: None,
            cancel_at_period_end: true,
            customer_email: None,
        }
    }

    #[test]
    fn new_subscriptions_are_free_and_active() {
        let sub = Subscription::free(TrainerId::new(), Timestamp::now());
        assert_eq!(sub.plan, Plan::Free);
        assert_eq!(sub.status, SubscriptionStatus::Active);
        assert!(sub.external_subscription_id.is_none());
    }

    #[test]
    fn apply_snapshot_copies_provider_fields() {
        let mut sub = Subscription::free(TrainerId::new(), Timestamp::now());
        sub.apply_snapshot(&snapshot(SubscriptionStatus::Active), Plan::Pro, Timestamp::now());

        assert_eq!(sub.plan, Plan::Pro);
        assert_eq!(sub.external_subscription_id.as_deref(), Some("sub_1"));
        assert_eq!(sub.external_customer_id.as_deref(), Some("ctm_1"));
        assert!(sub.cancel_at_period_end);
        assert!(sub.cancelled_at.is_none());
    }

    #[test]
    fn cancelled_snapshot_stamps_cancellation_once() {
        let mut sub = Subscription::free(TrainerId::new(), Timestamp::now());
        let first = Timestamp::now();
        sub.apply_snapshot(&snapshot(SubscriptionStatus::Cancelled), Plan::Pro, first);
        sub.apply_snapshot(&snapshot(SubscriptionStatus::Cancelled), Plan::Pro, first.plus_secs(60));
        assert_eq!(sub.cancelled_at, Some(first));
    }
}
