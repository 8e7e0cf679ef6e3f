//! Identity ports - principals, trainer profiles, auth tokens, password hashing.

use async_trait::async_trait;

use crate::domain::billing::Subscription;
use crate::domain::foundation::{DomainError, PrincipalId, Timestamp, TrainerId};
use crate::domain::identity::{AuthToken, Principal, Trainer};

#[async_trait]
pub trait PrincipalRepository: Send + Sync {
    /// Creates the principal, its trainer profile and the free subscription
    /// in one transaction.
    ///
    /// # Errors
    ///
    /// - `Conflict` if the email is taken
    async fn create_trainer_account(
        &self,
        principal: &Principal,
        trainer: &Trainer,
        subscription: &Subscription,
    ) -> Result<(), DomainError>;

    async fn find_by_id(&self, id: PrincipalId) -> Result<Option<Principal>, DomainError>;

    /// Lookup by normalized email.
    async fn find_by_email(&self, email: &str) -> Result<Option<Principal>, DomainError>;

    async fn update(&self, principal: &Principal) -> Result<(), DomainError>;
}

#[async_trait]
pub trait TrainerRepository: Send + Sync {
    async fn find_by_id(&self, id: TrainerId) -> Result<Option<Trainer>, DomainError>;

    async fn find_by_principal(&self, principal_id: PrincipalId) -> Result<Option<Trainer>, DomainError>;

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Trainer>, DomainError>;

    /// Any status; callers decide whether a pending domain resolves.
    async fn find_by_custom_domain(&self, domain: &str) -> Result<Option<Trainer>, DomainError>;

    async fn find_by_billing_customer(&self, customer_id: &str) -> Result<Option<Trainer>, DomainError>;

    /// Resolves through the owning principal's email.
    async fn find_by_email(&self, email: &str) -> Result<Option<Trainer>, DomainError>;

    /// Inserts a synthesized default profile and free subscription unless
    /// the principal already has a trainer, returning whichever exists.
    async fn create_default(&self, trainer: &Trainer, subscription: &Subscription) -> Result<Trainer, DomainError>;

    /// # Errors
    ///
    /// - `Conflict` if the slug or custom domain is taken
    /// - `NotFound` if the trainer does not exist
    async fn update(&self, trainer: &Trainer) -> Result<(), DomainError>;
}

#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn insert(&self, token: &AuthToken) -> Result<(), DomainError>;

    async fn find_by_hash(&self, token_hash: &str) -> Result<Option<AuthToken>, DomainError>;

    async fn revoke(&self, token_hash: &str, at: Timestamp) -> Result<(), DomainError>;

    /// Revokes every live token of a principal (suspension, deletion).
    async fn revoke_all_for(&self, principal_id: PrincipalId, at: Timestamp) -> Result<u64, DomainError>;
}

/// Password hashing. CPU-bound; implementations may block briefly.
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, password: &str) -> Result<String, DomainError>;

    fn verify(&self, password: &str, hash: &str) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(dead_code)]
    fn assert_object_safe(
        _: &dyn PrincipalRepository,
        _: &dyn TrainerRepository,
        _: &dyn TokenStore,
        _: &dyn PasswordHasher,
    ) {
    }
}
