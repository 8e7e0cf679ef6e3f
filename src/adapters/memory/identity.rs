use async_trait::async_trait;

use super::InMemoryStore;
use crate::domain::billing::Subscription;
use crate::domain::foundation::{DomainError, PrincipalId, Timestamp, TrainerId};
use crate::domain::identity::{AuthToken, Principal, Trainer};
use crate::ports::{PrincipalRepository, TokenStore, TrainerRepository};

#[async_trait]
impl PrincipalRepository for InMemoryStore {
    async fn create_trainer_account(
        &self,
        principal: &Principal,
        trainer: &Trainer,
        subscription: &Subscription,
    ) -> Result<(), DomainError> {
        let mut state = self.write().await;
        if state.principals.values().any(|p| p.email == principal.email) {
            return Err(DomainError::conflict("A user with this email already exists").with_detail("field", "email"));
        }
        if state.trainers.values().any(|t| t.slug == trainer.slug) {
            return Err(DomainError::conflict("This username is already taken").with_detail("field", "slug"));
        }
        state.principals.insert(principal.id, principal.clone());
        state.trainers.insert(trainer.id, trainer.clone());
        state.subscriptions.insert(trainer.id, subscription.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: PrincipalId) -> Result<Option<Principal>, DomainError> {
        Ok(self.read().await.principals.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Principal>, DomainError> {
        Ok(self
            .read()
            .await
            .principals
            .values()
            .find(|p| p.email == email)
            .cloned())
    }

    async fn update(&self, principal: &Principal) -> Result<(), DomainError> {
        let mut state = self.write().await;
        match state.principals.get_mut(&principal.id) {
            Some(existing) => {
                *existing = principal.clone();
                Ok(())
            }
            None => Err(DomainError::not_found("Principal")),
        }
    }
}

#[async_trait]
impl TrainerRepository for InMemoryStore {
    async fn find_by_id(&self, id: TrainerId) -> Result<Option<Trainer>, DomainError> {
        Ok(self.read().await.trainers.get(&id).cloned())
    }

    async fn find_by_principal(&self, principal_id: PrincipalId) -> Result<Option<Trainer>, DomainError> {
        Ok(self
            .read()
            .await
            .trainers
            .values()
            .find(|t| t.principal_id == principal_id)
            .cloned())
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Trainer>, DomainError> {
        Ok(self.read().await.trainers.values().find(|t| t.slug == slug).cloned())
    }

    async fn find_by_custom_domain(&self, domain: &str) -> Result<Option<Trainer>, DomainError> {
        Ok(self
            .read()
            .await
            .trainers
            .values()
            .find(|t| t.custom_domain.as_deref() == Some(domain))
            .cloned())
    }

    async fn find_by_billing_customer(&self, customer_id: &str) -> Result<Option<Trainer>, DomainError> {
        Ok(self
            .read()
            .await
            .trainers
            .values()
            .find(|t| t.billing_customer_id.as_deref() == Some(customer_id))
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Trainer>, DomainError> {
        let state = self.read().await;
        Ok(state
            .principals
            .values()
            .find(|p| p.email == email)
            .and_then(|p| state.trainers.values().find(|t| t.principal_id == p.id))
            .cloned())
    }

    async fn create_default(&self, trainer: &Trainer, subscription: &Subscription) -> Result<Trainer, DomainError> {
        let mut state = self.write().await;
        if let Some(existing) = state.trainers.values().find(|t| t.principal_id == trainer.principal_id) {
            return Ok(existing.clone());
        }
        let mut created = trainer.clone();
        if state.trainers.values().any(|t| t.slug == created.slug) {
            created.slug = format!("{}-{}", created.slug, &created.id.to_string()[..8]);
        }
        state.trainers.insert(created.id, created.clone());
        state.subscriptions.entry(created.id).or_insert_with(|| subscription.clone());
        Ok(created)
    }

    async fn update(&self, trainer: &Trainer) -> Result<(), DomainError> {
        let mut state = self.write().await;
        let clash = state.trainers.values().any(|t| {
            t.id != trainer.id
                && (t.slug == trainer.slug
                    || (trainer.custom_domain.is_some() && t.custom_domain == trainer.custom_domain)
                    || (trainer.billing_customer_id.is_some() && t.billing_customer_id == trainer.billing_customer_id))
        });
        if clash {
            return Err(DomainError::conflict("Slug, custom domain or billing customer already in use"));
        }
        match state.trainers.get_mut(&trainer.id) {
            Some(existing) => {
                *existing = trainer.clone();
                Ok(())
            }
            None => Err(DomainError::not_found("Trainer")),
        }
    }
}

#[async_trait]
impl TokenStore for InMemoryStore {
    async fn insert(&self, token: &AuthToken) -> Result<(), DomainError> {
        self.write().await.tokens.insert(token.token_hash.clone(), token.clone());
        Ok(())
    }

    async fn find_by_hash(&self, token_hash: &str) -> Result<Option<AuthToken>, DomainError> {
        Ok(self.read().await.tokens.get(token_hash).cloned())
    }

    async fn revoke(&self, token_hash: &str, at: Timestamp) -> Result<(), DomainError> {
        if let Some(token) = self.write().await.tokens.get_mut(token_hash) {
            token.revoked_at.get_or_insert(at);
        }
        Ok(())
    }

    async fn revoke_all_for(&self, principal_id: PrincipalId, at: Timestamp) -> Result<u64, DomainError> {
        let mut state = self.write().await;
        let mut revoked = 0;
        for token in state.tokens.values_mut() {
            if token.principal_id == principal_id && token.revoked_at.is_none() {
                token.revoked_at = Some(at);
                revoked += 1;
            }
        }
        Ok(revoked)
    }
}
