//! RegisterTrainerHandler - creates a principal, its trainer profile and a
//! free subscription, then signs the new user in.

use std::sync::Arc;

use crate::domain::billing::Subscription;
use crate::domain::foundation::{DomainError, Timestamp};
use crate::domain::identity::{
    normalize_email, validate_new_password, Principal, PrincipalProfile, TokenIssuer, Trainer,
};
use crate::ports::{PasswordHasher, PrincipalRepository, TokenStore};

#[derive(Debug, Clone)]
pub struct RegisterTrainerCommand {
    pub email: String,
    pub password: String,
    pub password_confirmation: String,
    pub profile: PrincipalProfile,
}

#[derive(Debug, Clone)]
pub struct RegisterTrainerResult {
    pub principal: Principal,
    pub trainer: Trainer,
    pub subscription: Subscription,
    /// Plaintext session token; only its digest is stored.
    pub token: String,
}

pub struct RegisterTrainerHandler {
    principals: Arc<dyn PrincipalRepository>,
    tokens: Arc<dyn TokenStore>,
    hasher: Arc<dyn PasswordHasher>,
    issuer: TokenIssuer,
}

impl RegisterTrainerHandler {
    pub fn new(
        principals: Arc<dyn PrincipalRepository>,
        tokens: Arc<dyn TokenStore>,
        hasher: Arc<dyn PasswordHasher>,
        issuer: TokenIssuer,
    ) -> Self {
        Self {
            principals,
            tokens,
            hasher,
            issuer,
        }
    }

    pub async fn handle(&self, cmd: RegisterTrainerCommand) -> Result<RegisterTrainerResult, DomainError> {
        let email = normalize_email(&cmd.email)?;
        validate_new_password(&cmd.password, &cmd.password_confirmation)?;

        if self.principals.find_by_email(&email).await?.is_some() {
            return Err(DomainError::conflict("A user with this email already exists").with_detail("field", "email"));
        }

        let now = Timestamp::now();
        let password_hash = self.hasher.hash(&cmd.password)?;
        let principal = Principal::new_trainer(email, password_hash, cmd.profile, now);
        let trainer = Trainer::for_principal(&principal, now);
        let subscription = Subscription::free(trainer.id, now);

        self.principals
            .create_trainer_account(&principal, &trainer, &subscription)
            .await?;

        let (token, record) = self.issuer.issue_session(principal.id, now)?;
        self.tokens.insert(&record).await?;

        tracing::info!(principal_id = %principal.id, trainer_id = %trainer.id, "trainer registered");

        Ok(RegisterTrainerResult {
            principal,
            trainer,
            subscription,
            token,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::auth::Argon2PasswordHasher;
    use crate::adapters::memory::InMemoryStore;
    use crate::domain::billing::SubscriptionStatus;
    use crate::domain::entitlement::Plan;
    use crate::domain::foundation::{ErrorCode, ErrorKind};
    use crate::ports::{SubscriptionRepository, TrainerRepository};

    fn handler(store: &InMemoryStore) -> RegisterTrainerHandler {
        RegisterTrainerHandler::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(Argon2PasswordHasher::new()),
            TokenIssuer::new("test-secret", None),
        )
    }

    fn command(email: &str) -> RegisterTrainerCommand {
        RegisterTrainerCommand {
            email: email.to_string(),
            password: "correct horse".to_string(),
            password_confirmation: "correct horse".to_string(),
            profile: PrincipalProfile {
                username: None,
                first_name: "Ada".to_string(),
                last_name: "Lovelace".to_string(),
                phone: None,
            },
        }
    }

    #[tokio::test]
    async fn signup_bootstraps_trainer_and_free_subscription() {
        let store = InMemoryStore::new();
        let result = handler(&store).handle(command("Ada@Example.com")).await.unwrap();

        assert_eq!(result.principal.email, "ada@example.com");
        assert_eq!(result.token.len(), 40);

        let trainer = TrainerRepository::find_by_principal(&store, result.principal.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(trainer.id, result.trainer.id);

        let subscription = store.find_by_trainer(trainer.id).await.unwrap().unwrap();
        assert_eq!(subscription.plan, Plan::Free);
        assert_eq!(subscription.status, SubscriptionStatus::Active);
    }

    #[tokio::test]
    async fn names_are_optional() {
        let store = InMemoryStore::new();
        let mut cmd = command("t@x.io");
        cmd.profile = PrincipalProfile::default();

        let result = handler(&store).handle(cmd).await.unwrap();
        assert_eq!(result.trainer.business_name, "t");
        assert_eq!(result.trainer.slug, "t");
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let store = InMemoryStore::new();
        let handler = handler(&store);
        handler.handle(command("ada@example.com")).await.unwrap();

        let err = handler.handle(command("ADA@example.com")).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Conflict);
    }

    #[tokio::test]
    async fn mismatched_passwords_are_rejected() {
        let store = InMemoryStore::new();
        let mut cmd = command("ada@example.com");
        cmd.password_confirmation = "something else".to_string();

        let err = handler(&store).handle(cmd).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
}
