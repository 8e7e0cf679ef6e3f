use async_trait::async_trait;

use super::InMemoryStore;
use crate::domain::admin::AdminAction;
use crate::domain::billing::SubscriptionStatus;
use crate::domain::entitlement::ResourceKind;
use crate::domain::foundation::{DomainError, Page, PageRequest, TrainerId};
use crate::ports::{AccountFlags, AdminRepository, TrainerOverview, UsageReader};

#[async_trait]
impl AdminRepository for InMemoryStore {
    async fn append_action(&self, action: &AdminAction) -> Result<(), DomainError> {
        self.write().await.admin_actions.push(action.clone());
        Ok(())
    }

    async fn list_actions(&self, page: PageRequest) -> Result<Page<AdminAction>, DomainError> {
        let state = self.read().await;
        let mut actions = state.admin_actions.clone();
        actions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(Page::new(page.slice(&actions), actions.len() as u64, page))
    }

    async fn search_trainers(&self, search: Option<&str>, page: PageRequest) -> Result<Page<TrainerOverview>, DomainError> {
        let state = self.read().await;
        let term = search.map(str::to_lowercase).filter(|t| !t.is_empty());
        let mut rows: Vec<TrainerOverview> = state
            .trainers
            .values()
            .filter_map(|trainer| {
                let principal = state.principals.get(&trainer.principal_id)?;
                let hit = term.as_deref().map_or(true, |t| {
                    trainer.business_name.to_lowercase().contains(t) || principal.email.contains(t)
                });
                if !hit {
                    return None;
                }
                let subscription = state.subscriptions.get(&trainer.id);
                Some(TrainerOverview {
                    trainer: trainer.clone(),
                    email: principal.email.clone(),
                    is_active: principal.is_active,
                    plan: state.plan_of(trainer.id),
                    subscription_status: subscription.map_or(SubscriptionStatus::Active, |s| s.status),
                })
            })
            .collect();
        rows.sort_by(|a, b| b.trainer.created_at.cmp(&a.trainer.created_at));
        Ok(Page::new(page.slice(&rows), rows.len() as u64, page))
    }

    async fn set_account_flags(&self, trainer_id: TrainerId, flags: AccountFlags) -> Result<bool, DomainError> {
        let mut state = self.write().await;
        let principal_id = match state.trainers.get_mut(&trainer_id) {
            Some(trainer) => {
                if let Some(verified) = flags.is_verified {
                    trainer.is_verified = verified;
                }
                trainer.principal_id
            }
            None => return Ok(false),
        };
        if let Some(principal) = state.principals.get_mut(&principal_id) {
            if let Some(active) = flags.is_active {
                principal.is_active = active;
            }
            if let Some(verified) = flags.is_verified {
                principal.is_verified = verified;
            }
        }
        Ok(true)
    }

    async fn delete_tenant(&self, trainer_id: TrainerId) -> Result<bool, DomainError> {
        let mut state = self.write().await;
        let principal_id = match state.trainers.remove(&trainer_id) {
            Some(trainer) => trainer.principal_id,
            None => return Ok(false),
        };
        state.notifications.retain(|_, n| n.trainer_id != trainer_id);
        state.executions.retain(|_, e| e.trainer_id != trainer_id);
        state.workflows.retain(|_, w| w.trainer_id != trainer_id);
        state.templates.retain(|_, t| t.trainer_id != trainer_id);
        state.pages.retain(|_, p| p.trainer_id != trainer_id);
        state.manual_payments.retain(|p| p.trainer_id != trainer_id);
        state.purchases.retain(|_, p| p.trainer_id != trainer_id);
        state.packages.retain(|_, p| p.trainer_id != trainer_id);
        state.bookings.retain(|_, b| b.trainer_id != trainer_id);
        state.clients.retain(|_, c| c.trainer_id != trainer_id);
        state.breaks.retain(|_, b| b.trainer_id != trainer_id);
        state.rules.retain(|_, r| r.trainer_id != trainer_id);
        state.payments.retain(|_, p| p.trainer_id != trainer_id);
        state.subscriptions.remove(&trainer_id);
        state.tokens.retain(|_, t| t.principal_id != principal_id);
        state.principals.remove(&principal_id);
        Ok(true)
    }
}

#[async_trait]
impl UsageReader for InMemoryStore {
    async fn count(&self, trainer_id: TrainerId, kind: ResourceKind) -> Result<u32, DomainError> {
        Ok(self.read().await.usage(trainer_id, kind))
    }
}
