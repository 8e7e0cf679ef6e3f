//! Client-side ports - roster, packages and manual payments.

use async_trait::async_trait;
use chrono::NaiveDate;

use super::QuotaWrite;
use crate::domain::clients::{Client, ManualPayment, Package, PackagePurchase};
use crate::domain::foundation::{
    ClientId, DomainError, PackageId, PackagePurchaseId, Page, PageRequest, TrainerId,
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientFilter {
    pub is_active: Option<bool>,
    /// Case-insensitive match on name or email.
    pub search: Option<String>,
}

impl ClientFilter {
    pub fn matches(&self, client: &Client) -> bool {
        let active = self.is_active.map_or(true, |a| client.is_active == a);
        let search = self.search.as_deref().map_or(true, |term| {
            let term = term.to_lowercase();
            client.name.to_lowercase().contains(&term) || client.email.contains(&term)
        });
        active && search
    }
}

#[async_trait]
pub trait ClientRepository: Send + Sync {
    /// Inserts a client. With `enforce_quota` an active client counts
    /// against the plan's client allowance.
    ///
    /// # Errors
    ///
    /// - `Conflict` if the trainer already has a client with this email
    async fn insert(&self, client: &Client, enforce_quota: bool) -> Result<QuotaWrite, DomainError>;

    /// Updates a client. With `enforce_quota`, reactivating an inactive
    /// client counts against the allowance.
    async fn update(&self, client: &Client, enforce_quota: bool) -> Result<QuotaWrite, DomainError>;

    async fn find(&self, trainer_id: TrainerId, id: ClientId) -> Result<Option<Client>, DomainError>;

    async fn find_by_id(&self, id: ClientId) -> Result<Option<Client>, DomainError>;

    /// Alphabetical by name.
    async fn list(&self, trainer_id: TrainerId, filter: &ClientFilter, page: PageRequest) -> Result<Page<Client>, DomainError>;

    async fn delete(&self, trainer_id: TrainerId, id: ClientId) -> Result<bool, DomainError>;
}

/// Outcome of consuming one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionUse {
    Consumed(PackagePurchase),
    Exhausted,
    Expired,
    NotFound,
}

#[async_trait]
pub trait PackageRepository: Send + Sync {
    /// # Errors
    ///
    /// - `Conflict` if the trainer already has a package with this name
    async fn save(&self, package: &Package) -> Result<(), DomainError>;

    async fn find(&self, trainer_id: TrainerId, id: PackageId) -> Result<Option<Package>, DomainError>;

    async fn list(&self, trainer_id: TrainerId, active_only: bool) -> Result<Vec<Package>, DomainError>;

    async fn insert_purchase(&self, purchase: &PackagePurchase) -> Result<(), DomainError>;

    async fn list_purchases(&self, trainer_id: TrainerId, client_id: Option<ClientId>) -> Result<Vec<PackagePurchase>, DomainError>;

    /// Decrements `sessions_remaining` iff the purchase is active on `today`,
    /// atomically so concurrent calls can never go below zero.
    async fn consume_session(&self, trainer_id: TrainerId, id: PackagePurchaseId, today: NaiveDate) -> Result<SessionUse, DomainError>;
}

#[async_trait]
pub trait ManualPaymentRepository: Send + Sync {
    /// Stores the payment and folds it into the client's rollups in one
    /// transaction. Returns the updated client.
    async fn record(&self, payment: &ManualPayment) -> Result<Client, DomainError>;

    async fn list_for_client(&self, trainer_id: TrainerId, client_id: ClientId) -> Result<Vec<ManualPayment>, DomainError>;

    /// Newest payment date first, with the total over all matching rows.
    async fn list(
        &self,
        trainer_id: TrainerId,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
        page: PageRequest,
    ) -> Result<(Page<ManualPayment>, i64), DomainError>;
}
