//! LoginHandler - password login issuing a session token.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, ErrorCode, Timestamp};
use crate::domain::identity::{normalize_email, Principal, TokenIssuer, Trainer};
use crate::ports::{PasswordHasher, PrincipalRepository, TokenStore, TrainerRepository};

#[derive(Debug, Clone)]
pub struct LoginCommand {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct LoginResult {
    pub principal: Principal,
    pub trainer: Option<Trainer>,
    pub token: String,
}

pub struct LoginHandler {
    principals: Arc<dyn PrincipalRepository>,
    trainers: Arc<dyn TrainerRepository>,
    tokens: Arc<dyn TokenStore>,
    hasher: Arc<dyn PasswordHasher>,
    issuer: TokenIssuer,
}

fn invalid_credentials() -> DomainError {
    DomainError::new(ErrorCode::Unauthorized, "Invalid email or password")
}

impl LoginHandler {
    pub fn new(
        principals: Arc<dyn PrincipalRepository>,
        trainers: Arc<dyn TrainerRepository>,
        tokens: Arc<dyn TokenStore>,
        hasher: Arc<dyn PasswordHasher>,
        issuer: TokenIssuer,
    ) -> Self {
        Self {
            principals,
            trainers,
            tokens,
            hasher,
            issuer,
        }
    }

    pub async fn handle(&self, cmd: LoginCommand) -> Result<LoginResult, DomainError> {
        let email = normalize_email(&cmd.email).map_err(|_| invalid_credentials())?;
        let mut principal = self
            .principals
            .find_by_email(&email)
            .await?
            .ok_or_else(invalid_credentials)?;

        // Same error for unknown email, wrong password and disabled accounts.
        if !principal.is_active || !self.hasher.verify(&cmd.password, &principal.password_hash) {
            return Err(invalid_credentials());
        }

        let now = Timestamp::now();
        principal.record_login(now);
        self.principals.update(&principal).await?;

        let (token, record) = self.issuer.issue_session(principal.id, now)?;
        self.tokens.insert(&record).await?;

        let trainer = self.trainers.find_by_principal(principal.id).await?;
        Ok(LoginResult {
            principal,
            trainer,
            token,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::auth::Argon2PasswordHasher;
    use crate::adapters::memory::InMemoryStore;
    use crate::application::handlers::identity::{RegisterTrainerCommand, RegisterTrainerHandler};
    use crate::domain::identity::PrincipalProfile;

    async fn registered(store: &InMemoryStore) -> Principal {
        RegisterTrainerHandler::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(Argon2PasswordHasher::new()),
            TokenIssuer::new("secret", None),
        )
        .handle(RegisterTrainerCommand {
            email: "coach@example.com".into(),
            password: "hunter2hunter2".into(),
            password_confirmation: "hunter2hunter2".into(),
            profile: PrincipalProfile {
                username: None,
                first_name: "Sam".into(),
                last_name: "Coach".into(),
                phone: None,
            },
        })
        .await
        .unwrap()
        .principal
    }

    fn handler(store: &InMemoryStore) -> LoginHandler {
        LoginHandler::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(Argon2PasswordHasher::new()),
            TokenIssuer::new("secret", None),
        )
    }

    #[tokio::test]
    async fn login_records_last_login_and_returns_trainer() {
        let store = InMemoryStore::new();
        registered(&store).await;

        let result = handler(&store)
            .handle(LoginCommand {
                email: "COACH@example.com".into(),
                password: "hunter2hunter2".into(),
            })
            .await
            .unwrap();
        assert!(result.principal.last_login_at.is_some());
        assert!(result.trainer.is_some());
    }

    #[tokio::test]
    async fn wrong_password_and_inactive_accounts_are_unauthorized() {
        let store = InMemoryStore::new();
        let mut principal = registered(&store).await;
        let handler = handler(&store);

        let err = handler
            .handle(LoginCommand {
                email: "coach@example.com".into(),
                password: "nope-nope-nope".into(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Unauthorized);

        principal.is_active = false;
        PrincipalRepository::update(&store, &principal).await.unwrap();
        let err = handler
            .handle(LoginCommand {
                email: "coach@example.com".into(),
                password: "hunter2hunter2".into(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Unauthorized);
    }
}
