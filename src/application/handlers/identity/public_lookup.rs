//! Public trainer resolution by slug or by an active custom domain.

use serde::Serialize;
use std::sync::Arc;

use crate::domain::clients::Package;
use crate::domain::foundation::DomainError;
use crate::domain::identity::{normalize_domain, DomainStatus, Trainer};
use crate::ports::{PackageRepository, TrainerRepository};

#[derive(Debug, Clone, Serialize)]
pub struct PublicTrainerProfile {
    pub trainer: Trainer,
    pub packages: Vec<Package>,
}

pub struct PublicTrainerLookup {
    trainers: Arc<dyn TrainerRepository>,
    packages: Arc<dyn PackageRepository>,
}

impl PublicTrainerLookup {
    pub fn new(trainers: Arc<dyn TrainerRepository>, packages: Arc<dyn PackageRepository>) -> Self {
        Self { trainers, packages }
    }

    pub async fn by_slug(&self, slug: &str) -> Result<PublicTrainerProfile, DomainError> {
        let trainer = self
            .trainers
            .find_by_slug(&slug.trim().to_lowercase())
            .await?
            .ok_or_else(|| DomainError::not_found("trainer"))?;
        self.profile(trainer).await
    }

    /// Pending domains do not resolve.
    pub async fn by_domain(&self, domain: &str) -> Result<PublicTrainerProfile, DomainError> {
        let domain = normalize_domain(domain).map_err(|_| DomainError::not_found("trainer"))?;
        let trainer = self
            .trainers
            .find_by_custom_domain(&domain)
            .await?
            .filter(|t| t.custom_domain_status == Some(DomainStatus::Active))
            .ok_or_else(|| DomainError::not_found("trainer"))?;
        self.profile(trainer).await
    }

    async fn profile(&self, trainer: Trainer) -> Result<PublicTrainerProfile, DomainError> {
        let packages = self.packages.list(trainer.id, true).await?;
        Ok(PublicTrainerProfile { trainer, packages })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryStore;
    use crate::domain::billing::Subscription;
    use crate::domain::clients::PackageTerms;
    use crate::domain::foundation::{ErrorCode, Timestamp};
    use crate::domain::identity::{Principal, PrincipalProfile};
    use crate::ports::PrincipalRepository;

    async fn trainer_with_package(store: &InMemoryStore) -> Trainer {
        let now = Timestamp::now();
        let principal = Principal::new_trainer(
            "jo.fit@example.com".into(),
            "hash".into(),
            PrincipalProfile {
                username: None,
                first_name: "Jo".into(),
                last_name: "Fit".into(),
                phone: None,
            },
            now,
        );
        let trainer = Trainer::for_principal(&principal, now);
        store
            .create_trainer_account(&principal, &trainer, &Subscription::free(trainer.id, now))
            .await
            .unwrap();
        let terms = |name: &str| PackageTerms {
            name: name.into(),
            description: String::new(),
            sessions_count: 5,
            price_cents: 25_000,
            currency: "USD".into(),
            validity_days: None,
        };
        PackageRepository::save(store, &Package::new(trainer.id, terms("Starter"), now).unwrap())
            .await
            .unwrap();
        let mut retired = Package::new(trainer.id, terms("Retired"), now).unwrap();
        retired.update(terms("Retired"), false, now).unwrap();
        PackageRepository::save(store, &retired).await.unwrap();
        trainer
    }

    #[tokio::test]
    async fn slug_lookup_lists_active_packages_only() {
        let store = InMemoryStore::new();
        trainer_with_package(&store).await;
        let lookup = PublicTrainerLookup::new(Arc::new(store.clone()), Arc::new(store));

        let profile = lookup.by_slug("jo.fit").await.unwrap();
        assert_eq!(profile.packages.len(), 1);
        assert_eq!(profile.packages[0].name, "Starter");
    }

    #[tokio::test]
    async fn only_active_domains_resolve() {
        let store = InMemoryStore::new();
        let mut trainer = trainer_with_package(&store).await;
        let now = Timestamp::now();
        trainer.request_custom_domain(Some("jo.example.com".into()), now).unwrap();
        TrainerRepository::update(&store, &trainer).await.unwrap();
        let lookup = PublicTrainerLookup::new(Arc::new(store.clone()), Arc::new(store.clone()));

        let err = lookup.by_domain("jo.example.com").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);

        trainer.activate_custom_domain(now).unwrap();
        TrainerRepository::update(&store, &trainer).await.unwrap();
        assert_eq!(lookup.by_domain("JO.example.com").await.unwrap().trainer.id, trainer.id);
    }
}
