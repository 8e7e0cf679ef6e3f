//! AdminTrainersHandler - cross-tenant trainer search and account actions.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use std::collections::BTreeMap;
use std::sync::Arc;

use super::actor::AdminActor;
use crate::application::events::publish_after_commit;
use crate::domain::admin::{AdminActionKind, BulkAction, BulkOutcome};
use crate::domain::foundation::{DomainError, Page, PageRequest, Timestamp, TrainerId};
use crate::domain::identity::{AuthToken, TokenIssuer, Trainer};
use crate::domain::workflow::TenantEvent;
use crate::ports::{AccountFlags, AdminRepository, EventPublisher, TokenStore, TrainerOverview, TrainerRepository};

pub const DEFAULT_IMPERSONATION_MINUTES: i64 = 60;

#[derive(Debug, Clone, Deserialize)]
pub struct BulkActionCommand {
    pub action: BulkAction,
    pub trainer_ids: Vec<TrainerId>,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImpersonationResult {
    pub token: String,
    pub expires_at: Option<Timestamp>,
    pub trainer: Trainer,
}

pub struct AdminTrainersHandler {
    admin: Arc<dyn AdminRepository>,
    trainers: Arc<dyn TrainerRepository>,
    tokens: Arc<dyn TokenStore>,
    issuer: TokenIssuer,
    publisher: Arc<dyn EventPublisher>,
    impersonation_minutes: i64,
}

impl AdminTrainersHandler {
    pub fn new(
        admin: Arc<dyn AdminRepository>,
        trainers: Arc<dyn TrainerRepository>,
        tokens: Arc<dyn TokenStore>,
        issuer: TokenIssuer,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            admin,
            trainers,
            tokens,
            issuer,
            publisher,
            impersonation_minutes: DEFAULT_IMPERSONATION_MINUTES,
        }
    }

    pub fn with_impersonation_minutes(mut self, minutes: i64) -> Self {
        self.impersonation_minutes = minutes;
        self
    }

    /// Searches business name and email.
    pub async fn search(&self, _actor: &AdminActor, search: Option<&str>, page: PageRequest) -> Result<Page<TrainerOverview>, DomainError> {
        self.admin.search_trainers(search, page).await
    }

    /// Applies the action to each trainer independently. One target failing
    /// does not stop the others.
    pub async fn bulk_action(&self, actor: &AdminActor, cmd: BulkActionCommand) -> Result<BulkOutcome, DomainError> {
        let mut result = BulkOutcome::default();
        for trainer_id in cmd.trainer_ids {
            let trainer = match self.trainers.find_by_id(trainer_id).await? {
                Some(trainer) => trainer,
                None => {
                    result.record_failure(trainer_id, None, "trainer not found");
                    continue;
                }
            };
            if trainer.principal_id == actor.principal_id && matches!(cmd.action, BulkAction::Suspend | BulkAction::Delete) {
                result.record_failure(trainer_id, Some(trainer.business_name), "cannot apply this action to your own account");
                continue;
            }

            match self.apply(cmd.action, &trainer).await {
                Ok(()) => {
                    let mut details = BTreeMap::new();
                    details.insert("business_name".to_string(), JsonValue::from(trainer.business_name.clone()));
                    if let Some(reason) = &cmd.reason {
                        details.insert("reason".to_string(), JsonValue::from(reason.clone()));
                    }
                    self.admin
                        .append_action(&actor.audit(cmd.action.audit_kind(), Some(trainer_id), details))
                        .await?;
                    result.record_success();
                }
                Err(e) => {
                    tracing::warn!(trainer_id = %trainer_id, action = ?cmd.action, error = %e, "bulk action failed for trainer");
                    result.record_failure(trainer_id, Some(trainer.business_name), e.message);
                }
            }
        }
        tracing::info!(admin_id = %actor.principal_id, action = ?cmd.action, succeeded = result.success_count, failed = result.failed.len(), "bulk action finished");
        Ok(result)
    }

    async fn apply(&self, action: BulkAction, trainer: &Trainer) -> Result<(), DomainError> {
        let flags = match action {
            BulkAction::Suspend => AccountFlags {
                is_active: Some(false),
                is_verified: None,
            },
            BulkAction::Activate => AccountFlags {
                is_active: Some(true),
                is_verified: None,
            },
            BulkAction::Verify => AccountFlags {
                is_active: None,
                is_verified: Some(true),
            },
            BulkAction::Delete => {
                if !self.admin.delete_tenant(trainer.id).await? {
                    return Err(DomainError::not_found("trainer"));
                }
                publish_after_commit(
                    self.publisher.as_ref(),
                    vec![TenantEvent::tenant_deleted(trainer.id, Timestamp::now())],
                )
                .await;
                return Ok(());
            }
        };
        if !self.admin.set_account_flags(trainer.id, flags).await? {
            return Err(DomainError::not_found("trainer"));
        }
        if action == BulkAction::Suspend {
            self.tokens.revoke_all_for(trainer.principal_id, Timestamp::now()).await?;
        }
        Ok(())
    }

    /// Issues a short-lived token acting as the trainer's principal.
    pub async fn impersonate(&self, actor: &AdminActor, trainer_id: TrainerId, reason: Option<String>) -> Result<ImpersonationResult, DomainError> {
        let trainer = self
            .trainers
            .find_by_id(trainer_id)
            .await?
            .ok_or_else(|| DomainError::not_found("trainer"))?;

        let (token, record): (String, AuthToken) = self.issuer.issue_impersonation(
            trainer.principal_id,
            actor.principal_id,
            Timestamp::now(),
            self.impersonation_minutes,
        )?;
        self.tokens.insert(&record).await?;

        let mut details = BTreeMap::new();
        details.insert("expires_in_minutes".to_string(), json!(self.impersonation_minutes));
        if let Some(reason) = reason {
            details.insert("reason".to_string(), JsonValue::from(reason));
        }
        self.admin
            .append_action(&actor.audit(AdminActionKind::Impersonate, Some(trainer_id), details))
            .await?;
        tracing::info!(admin_id = %actor.principal_id, trainer_id = %trainer_id, "impersonation token issued");

        Ok(ImpersonationResult {
            token,
            expires_at: record.expires_at,
            trainer,
        })
    }

    /// Marks a requested custom domain as live.
    pub async fn activate_domain(&self, actor: &AdminActor, trainer_id: TrainerId) -> Result<Trainer, DomainError> {
        let mut trainer = self
            .trainers
            .find_by_id(trainer_id)
            .await?
            .ok_or_else(|| DomainError::not_found("trainer"))?;
        trainer.activate_custom_domain(Timestamp::now())?;
        self.trainers.update(&trainer).await?;

        let mut details = BTreeMap::new();
        details.insert("domain".to_string(), JsonValue::from(trainer.custom_domain.clone()));
        self.admin
            .append_action(&actor.audit(AdminActionKind::ActivateDomain, Some(trainer_id), details))
            .await?;
        Ok(trainer)
    }
}
