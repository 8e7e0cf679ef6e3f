//! TrainerProfileHandler - profile edits, custom domain requests and branding.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::application::handlers::entitlement::EntitlementGate;
use crate::domain::entitlement::Feature;
use crate::domain::foundation::{DomainError, Timestamp};
use crate::domain::identity::{parse_timezone, TenantContext, Trainer};
use crate::ports::TrainerRepository;

/// Partial profile update; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct UpdateTrainerProfileCommand {
    pub business_name: Option<String>,
    pub bio: Option<String>,
    pub expertise: Option<BTreeSet<String>>,
    pub location: Option<String>,
    pub timezone: Option<String>,
}

pub struct TrainerProfileHandler {
    trainers: Arc<dyn TrainerRepository>,
    gate: EntitlementGate,
}

impl TrainerProfileHandler {
    pub fn new(trainers: Arc<dyn TrainerRepository>, gate: EntitlementGate) -> Self {
        Self { trainers, gate }
    }

    async fn load(&self, ctx: &TenantContext) -> Result<Trainer, DomainError> {
        self.trainers
            .find_by_id(ctx.trainer_id)
            .await?
            .ok_or_else(|| DomainError::not_found("trainer"))
    }

    pub async fn get(&self, ctx: &TenantContext) -> Result<Trainer, DomainError> {
        self.load(ctx).await
    }

    pub async fn update(&self, ctx: &TenantContext, cmd: UpdateTrainerProfileCommand) -> Result<Trainer, DomainError> {
        self.gate.ensure_writable(ctx).await?;
        let mut trainer = self.load(ctx).await?;

        if let Some(name) = cmd.business_name {
            let name = name.trim();
            if name.is_empty() {
                return Err(DomainError::validation("business_name", "Business name cannot be empty"));
            }
            trainer.business_name = name.to_string();
        }
        if let Some(bio) = cmd.bio {
            trainer.bio = bio;
        }
        if let Some(expertise) = cmd.expertise {
            trainer.expertise = expertise
                .into_iter()
                .map(|tag| tag.trim().to_lowercase())
                .filter(|tag| !tag.is_empty())
                .collect();
        }
        if let Some(location) = cmd.location {
            trainer.location = location.trim().to_string();
        }
        if let Some(zone) = cmd.timezone {
            trainer.timezone = parse_timezone(&zone)?;
        }
        trainer.updated_at = Timestamp::now();

        self.trainers.update(&trainer).await?;
        Ok(trainer)
    }

    /// Requests (or clears) a custom domain. A new domain starts `pending`.
    pub async fn set_custom_domain(&self, ctx: &TenantContext, domain: Option<String>) -> Result<Trainer, DomainError> {
        self.gate.ensure_writable(ctx).await?;
        if domain.is_some() {
            self.gate.require_feature(ctx, Feature::CustomDomain).await?;
        }
        let mut trainer = self.load(ctx).await?;
        trainer.request_custom_domain(domain, Timestamp::now())?;

        if let Some(requested) = trainer.custom_domain.as_deref() {
            if let Some(owner) = self.trainers.find_by_custom_domain(requested).await? {
                if owner.id != trainer.id {
                    return Err(DomainError::conflict("This domain is already in use").with_detail("field", "custom_domain"));
                }
            }
        }

        self.trainers.update(&trainer).await?;
        Ok(trainer)
    }

    pub async fn set_branding(
        &self,
        ctx: &TenantContext,
        brand_color: Option<String>,
        hide_platform_branding: bool,
    ) -> Result<Trainer, DomainError> {
        self.gate.ensure_writable(ctx).await?;
        self.gate.require_feature(ctx, Feature::WhiteLabel).await?;
        let mut trainer = self.load(ctx).await?;
        trainer.set_branding(brand_color, hide_platform_branding, Timestamp::now())?;
        self.trainers.update(&trainer).await?;
        Ok(trainer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryStore;
    use crate::domain::billing::Subscription;
    use crate::domain::entitlement::Plan;
    use crate::domain::foundation::ErrorCode;
    use crate::domain::identity::{DomainStatus, Principal, PrincipalProfile};
    use crate::ports::{PrincipalRepository, SubscriptionRepository};

    async fn setup(plan: Plan) -> (InMemoryStore, TrainerProfileHandler, TenantContext) {
        let store = InMemoryStore::new();
        let now = Timestamp::now();
        let principal = Principal::new_trainer(
            "pat@example.com".into(),
            "hash".into(),
            PrincipalProfile {
                username: Some("pat".into()),
                first_name: "Pat".into(),
                last_name: "Jones".into(),
                phone: None,
            },
            now,
        );
        let trainer = Trainer::for_principal(&principal, now);
        let mut subscription = Subscription::free(trainer.id, now);
        subscription.plan = plan;
        store.create_trainer_account(&principal, &trainer, &subscription).await.unwrap();

        let gate = EntitlementGate::new(Arc::new(store.clone()), Arc::new(store.clone()));
        let handler = TrainerProfileHandler::new(Arc::new(store.clone()), gate);
        let ctx = TenantContext::new(principal.id, trainer.id, trainer.timezone);
        (store, handler, ctx)
    }

    #[tokio::test]
    async fn updates_profile_fields() {
        let (_, handler, ctx) = setup(Plan::Free).await;
        let trainer = handler
            .update(
                &ctx,
                UpdateTrainerProfileCommand {
                    business_name: Some("  Pat Lifts ".into()),
                    timezone: Some("Europe/Berlin".into()),
                    expertise: Some(["Strength".to_string(), " ".to_string()].into_iter().collect()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(trainer.business_name, "Pat Lifts");
        assert_eq!(trainer.timezone, chrono_tz::Europe::Berlin);
        assert_eq!(trainer.expertise.len(), 1);
    }

    #[tokio::test]
    async fn custom_domain_needs_business_plan() {
        let (_, handler, ctx) = setup(Plan::Pro).await;
        let err = handler
            .set_custom_domain(&ctx, Some("coach.example.com".into()))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::FeatureNotIncluded);
    }

    #[tokio::test]
    async fn custom_domain_starts_pending() {
        let (store, handler, ctx) = setup(Plan::Business).await;
        let trainer = handler
            .set_custom_domain(&ctx, Some("Coach.Example.com".into()))
            .await
            .unwrap();
        assert_eq!(trainer.custom_domain.as_deref(), Some("coach.example.com"));
        assert_eq!(trainer.custom_domain_status, Some(DomainStatus::Pending));
        assert!(store.find_by_trainer(ctx.trainer_id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn branding_validates_color() {
        let (_, handler, ctx) = setup(Plan::Business).await;
        let err = handler.set_branding(&ctx, Some("red".into()), true).await.unwrap_err();
        assert_eq!(err.kind(), crate::domain::foundation::ErrorKind::Validation);

        let trainer = handler.set_branding(&ctx, Some("#a1b2c3".into()), true).await.unwrap();
        assert_eq!(trainer.brand_color.as_deref(), Some("#A1B2C3"));
        assert!(trainer.hide_platform_branding);
    }
}
