//! Admin ports - cross-tenant reads and account mutations for superusers.

use async_trait::async_trait;
use serde::Serialize;

use crate::domain::admin::AdminAction;
use crate::domain::billing::SubscriptionStatus;
use crate::domain::entitlement::Plan;
use crate::domain::foundation::{DomainError, Page, PageRequest, TrainerId};
use crate::domain::identity::Trainer;

/// A trainer row in the admin listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainerOverview {
    pub trainer: Trainer,
    pub email: String,
    pub is_active: bool,
    pub plan: Plan,
    pub subscription_status: SubscriptionStatus,
}

/// Account flag changes applied together.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccountFlags {
    pub is_active: Option<bool>,
    pub is_verified: Option<bool>,
}

#[async_trait]
pub trait AdminRepository: Send + Sync {
    async fn append_action(&self, action: &AdminAction) -> Result<(), DomainError>;

    /// Newest first.
    async fn list_actions(&self, page: PageRequest) -> Result<Page<AdminAction>, DomainError>;

    /// Case-insensitive search over business name and email.
    async fn search_trainers(&self, search: Option<&str>, page: PageRequest) -> Result<Page<TrainerOverview>, DomainError>;

    /// Applies flag changes to the trainer and its principal in one
    /// transaction. Returns false if the trainer does not exist.
    async fn set_account_flags(&self, trainer_id: TrainerId, flags: AccountFlags) -> Result<bool, DomainError>;

    /// Deletes the trainer, its principal and every tenant-owned row in
    /// dependency order. Returns false if the trainer does not exist.
    async fn delete_tenant(&self, trainer_id: TrainerId) -> Result<bool, DomainError>;
}
