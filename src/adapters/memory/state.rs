use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::domain::admin::AdminAction;
use crate::domain::billing::{Payment, Subscription, WebhookEvent};
use crate::domain::clients::{Client, ManualPayment, Package, PackagePurchase};
use crate::domain::entitlement::{Plan, QuotaCheck, ResourceKind};
use crate::domain::foundation::{
    AvailabilityRuleId, BookingId, BreakId, ClientId, ExecutionId, JobId, NotificationId,
    PackageId, PackagePurchaseId, PageId, PaymentId, PrincipalId, TemplateId, TrainerId,
    WorkflowId,
};
use crate::domain::identity::{AuthToken, Principal, Trainer};
use crate::domain::notification::Notification;
use crate::domain::pages::Page;
use crate::domain::scheduling::{AvailabilityRule, Booking, BreakPeriod};
use crate::domain::workflow::{MessageTemplate, Workflow, WorkflowExecution};
use crate::ports::{Job, QuotaWrite};

#[derive(Default)]
pub(super) struct MemoryState {
    pub principals: HashMap<PrincipalId, Principal>,
    pub trainers: HashMap<TrainerId, Trainer>,
    pub tokens: HashMap<String, AuthToken>,
    pub subscriptions: HashMap<TrainerId, Subscription>,
    pub payments: HashMap<PaymentId, Payment>,
    pub webhook_events: HashMap<String, WebhookEvent>,
    pub rules: HashMap<AvailabilityRuleId, AvailabilityRule>,
    pub breaks: HashMap<BreakId, BreakPeriod>,
    pub bookings: HashMap<BookingId, Booking>,
    pub clients: HashMap<ClientId, Client>,
    pub packages: HashMap<PackageId, Package>,
    pub purchases: HashMap<PackagePurchaseId, PackagePurchase>,
    pub manual_payments: Vec<ManualPayment>,
    pub pages: HashMap<PageId, Page>,
    pub workflows: HashMap<WorkflowId, Workflow>,
    pub executions: HashMap<ExecutionId, WorkflowExecution>,
    pub templates: HashMap<TemplateId, MessageTemplate>,
    pub notifications: HashMap<NotificationId, Notification>,
    pub jobs: HashMap<JobId, Job>,
    pub admin_actions: Vec<AdminAction>,
}

impl MemoryState {
    pub fn plan_of(&self, trainer_id: TrainerId) -> Plan {
        self.subscriptions
            .get(&trainer_id)
            .map(|s| s.plan)
            .unwrap_or(Plan::Free)
    }

    /// Live usage: active clients, all pages, active workflows.
    pub fn usage(&self, trainer_id: TrainerId, kind: ResourceKind) -> u32 {
        let count = match kind {
            ResourceKind::Clients => self
                .clients
                .values()
                .filter(|c| c.trainer_id == trainer_id && c.is_active)
                .count(),
            ResourceKind::Pages => self.pages.values().filter(|p| p.trainer_id == trainer_id).count(),
            ResourceKind::Workflows => self
                .workflows
                .values()
                .filter(|w| w.trainer_id == trainer_id && w.is_active)
                .count(),
        };
        u32::try_from(count).unwrap_or(u32::MAX)
    }

    /// Quota decision for consuming one more unit of `kind`.
    pub fn quota(&self, trainer_id: TrainerId, kind: ResourceKind, enforce: bool) -> QuotaWrite {
        if !enforce {
            return QuotaWrite::Written;
        }
        let check = QuotaCheck::evaluate(self.plan_of(trainer_id), kind, self.usage(trainer_id, kind));
        if check.allowed {
            QuotaWrite::Written
        } else {
            QuotaWrite::Denied(check)
        }
    }

    pub fn trainer_email(&self, trainer: &Trainer) -> Option<&str> {
        self.principals.get(&trainer.principal_id).map(|p| p.email.as_str())
    }
}

/// Shared handle to the in-memory tables. Clones share state.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<RwLock<MemoryState>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub(super) async fn read(&self) -> RwLockReadGuard<'_, MemoryState> {
        self.inner.read().await
    }

    pub(super) async fn write(&self) -> RwLockWriteGuard<'_, MemoryState> {
        self.inner.write().await
    }

    /// Inserts a principal without a trainer profile, e.g. an operator account.
    pub async fn seed_principal(&self, principal: Principal) {
        self.write().await.principals.insert(principal.id, principal);
    }

    /// All queued or running jobs, for assertions.
    pub async fn pending_jobs(&self) -> Vec<Job> {
        let state = self.read().await;
        let mut jobs: Vec<Job> = state
            .jobs
            .values()
            .filter(|j| matches!(j.status, crate::ports::JobStatus::Queued | crate::ports::JobStatus::Running))
            .cloned()
            .collect();
        jobs.sort_by_key(|j| j.run_at);
        jobs
    }
}
