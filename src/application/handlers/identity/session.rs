//! Token authentication, tenant resolution and logout.

use std::sync::Arc;

use crate::domain::billing::Subscription;
use crate::domain::foundation::{DomainError, ErrorCode, PrincipalId, Timestamp};
use crate::domain::identity::{Principal, TenantContext, TokenIssuer, Trainer};
use crate::ports::{PrincipalRepository, TokenStore, TrainerRepository};

/// An authenticated request principal.
#[derive(Debug, Clone)]
pub struct Session {
    pub principal: Principal,
    pub token_hash: String,
    /// Set when the token was issued to an admin acting as `principal`.
    pub impersonated_by: Option<PrincipalId>,
}

impl Session {
    pub fn is_superuser(&self) -> bool {
        self.principal.is_superuser && self.impersonated_by.is_none()
    }
}

fn unauthorized() -> DomainError {
    DomainError::new(ErrorCode::Unauthorized, "Invalid or expired token")
}

/// Resolves opaque tokens to sessions and sessions to tenant contexts.
#[derive(Clone)]
pub struct TenantResolver {
    tokens: Arc<dyn TokenStore>,
    principals: Arc<dyn PrincipalRepository>,
    trainers: Arc<dyn TrainerRepository>,
    issuer: TokenIssuer,
}

impl TenantResolver {
    pub fn new(
        tokens: Arc<dyn TokenStore>,
        principals: Arc<dyn PrincipalRepository>,
        trainers: Arc<dyn TrainerRepository>,
        issuer: TokenIssuer,
    ) -> Self {
        Self {
            tokens,
            principals,
            trainers,
            issuer,
        }
    }

    /// Token must exist, be unrevoked and unexpired; the principal must be active.
    pub async fn authenticate(&self, token: &str) -> Result<Session, DomainError> {
        let token_hash = self.issuer.digest(token)?;
        let record = self
            .tokens
            .find_by_hash(&token_hash)
            .await?
            .filter(|t| t.is_usable(Timestamp::now()))
            .ok_or_else(unauthorized)?;

        let principal = self
            .principals
            .find_by_id(record.principal_id)
            .await?
            .filter(|p| p.is_active)
            .ok_or_else(unauthorized)?;

        Ok(Session {
            principal,
            token_hash,
            impersonated_by: record.impersonated_by,
        })
    }

    /// Tenant routes: a principal without a trainer record is rejected.
    pub async fn tenant(&self, session: &Session) -> Result<TenantContext, DomainError> {
        let trainer = self
            .trainers
            .find_by_principal(session.principal.id)
            .await?
            .ok_or_else(|| DomainError::new(ErrorCode::NotATrainer, "No trainer profile for this account"))?;
        Ok(context_for(session, &trainer))
    }

    /// Self-service routes: synthesize a default trainer profile and free
    /// subscription on first access.
    pub async fn tenant_or_default(&self, session: &Session) -> Result<(Trainer, TenantContext), DomainError> {
        let trainer = match self.trainers.find_by_principal(session.principal.id).await? {
            Some(trainer) => trainer,
            None => {
                let now = Timestamp::now();
                let draft = Trainer::for_principal(&session.principal, now);
                let subscription = Subscription::free(draft.id, now);
                let created = self.trainers.create_default(&draft, &subscription).await?;
                tracing::info!(principal_id = %session.principal.id, trainer_id = %created.id, "default trainer profile created");
                created
            }
        };
        let ctx = context_for(session, &trainer);
        Ok((trainer, ctx))
    }
}

fn context_for(session: &Session, trainer: &Trainer) -> TenantContext {
    let mut ctx = TenantContext::new(session.principal.id, trainer.id, trainer.timezone);
    ctx.is_superuser = session.is_superuser();
    ctx.impersonated_by = session.impersonated_by;
    ctx
}

pub struct LogoutHandler {
    tokens: Arc<dyn TokenStore>,
}

impl LogoutHandler {
    pub fn new(tokens: Arc<dyn TokenStore>) -> Self {
        Self { tokens }
    }

    pub async fn handle(&self, session: &Session) -> Result<(), DomainError> {
        self.tokens.revoke(&session.token_hash, Timestamp::now()).await
    }
}
