//! ManagePackagesHandler - packages, assignments and session use.

use chrono::NaiveDate;
use std::sync::Arc;

use super::local_today;
use crate::application::events::publish_after_commit;
use crate::application::handlers::entitlement::EntitlementGate;
use crate::domain::clients::{Package, PackagePurchase, PackageTerms};
use crate::domain::foundation::{ClientId, DomainError, ErrorCode, PackageId, PackagePurchaseId, Timestamp};
use crate::domain::identity::TenantContext;
use crate::domain::workflow::TenantEvent;
use crate::ports::{ClientRepository, EventPublisher, PackageRepository, SessionUse, TrainerRepository};

#[derive(Debug, Clone)]
pub struct AssignPackageCommand {
    pub package_id: PackageId,
    pub client_id: ClientId,
    pub expiry_date: Option<NaiveDate>,
}

pub struct ManagePackagesHandler {
    packages: Arc<dyn PackageRepository>,
    clients: Arc<dyn ClientRepository>,
    trainers: Arc<dyn TrainerRepository>,
    gate: EntitlementGate,
    publisher: Arc<dyn EventPublisher>,
}

impl ManagePackagesHandler {
    pub fn new(
        packages: Arc<dyn PackageRepository>,
        clients: Arc<dyn ClientRepository>,
        trainers: Arc<dyn TrainerRepository>,
        gate: EntitlementGate,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            packages,
            clients,
            trainers,
            gate,
            publisher,
        }
    }

    pub async fn list(&self, ctx: &TenantContext, active_only: bool) -> Result<Vec<Package>, DomainError> {
        self.packages.list(ctx.trainer_id, active_only).await
    }

    pub async fn create(&self, ctx: &TenantContext, terms: PackageTerms) -> Result<Package, DomainError> {
        self.gate.ensure_writable(ctx).await?;
        let package = Package::new(ctx.trainer_id, terms, Timestamp::now())?;
        self.packages.save(&package).await?;
        Ok(package)
    }

    pub async fn update(
        &self,
        ctx: &TenantContext,
        id: PackageId,
        terms: PackageTerms,
        is_active: bool,
    ) -> Result<Package, DomainError> {
        self.gate.ensure_writable(ctx).await?;
        let mut package = self.find(ctx, id).await?;
        package.update(terms, is_active, Timestamp::now())?;
        self.packages.save(&package).await?;
        Ok(package)
    }

    async fn find(&self, ctx: &TenantContext, id: PackageId) -> Result<Package, DomainError> {
        self.packages
            .find(ctx.trainer_id, id)
            .await?
            .ok_or_else(|| DomainError::not_found("package"))
    }

    pub async fn assign(&self, ctx: &TenantContext, cmd: AssignPackageCommand) -> Result<PackagePurchase, DomainError> {
        self.gate.ensure_writable(ctx).await?;
        let package = self.find(ctx, cmd.package_id).await?;
        if !package.is_active {
            return Err(DomainError::validation("package", "Package is not active"));
        }
        let client = self
            .clients
            .find(ctx.trainer_id, cmd.client_id)
            .await?
            .ok_or_else(|| DomainError::validation("client_id", "Client not found for this trainer"))?;

        let now = Timestamp::now();
        let purchase = PackagePurchase::assign(&package, client.id, cmd.expiry_date, local_today(ctx.timezone), now);
        self.packages.insert_purchase(&purchase).await?;

        if let Some(trainer) = self.trainers.find_by_id(ctx.trainer_id).await? {
            publish_after_commit(
                self.publisher.as_ref(),
                vec![TenantEvent::package_purchased(&purchase, &package, &client, &trainer, now)],
            )
            .await;
        }
        Ok(purchase)
    }

    pub async fn list_purchases(
        &self,
        ctx: &TenantContext,
        client_id: Option<ClientId>,
    ) -> Result<Vec<PackagePurchase>, DomainError> {
        self.packages.list_purchases(ctx.trainer_id, client_id).await
    }

    /// Decrements the remaining sessions iff the purchase is active today.
    pub async fn use_session(&self, ctx: &TenantContext, id: PackagePurchaseId) -> Result<PackagePurchase, DomainError> {
        self.gate.ensure_writable(ctx).await?;
        match self
            .packages
            .consume_session(ctx.trainer_id, id, local_today(ctx.timezone))
            .await?
        {
            SessionUse::Consumed(purchase) => Ok(purchase),
            SessionUse::Exhausted => Err(DomainError::new(
                ErrorCode::PackageExhausted,
                "No sessions remaining on this package",
            )),
            SessionUse::Expired => Err(DomainError::new(ErrorCode::PackageExhausted, "This package has expired")
                .with_detail("reason", "expired")),
            SessionUse::NotFound => Err(DomainError::not_found("package purchase")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::test_support::Fixture;
    use crate::domain::entitlement::Plan;
    use chrono::Duration;

    fn terms(name: &str, sessions: u32) -> PackageTerms {
        PackageTerms {
            name: name.into(),
            description: "Intro block".into(),
            sessions_count: sessions,
            price_cents: 12_000,
            currency: "USD".into(),
            validity_days: Some(30),
        }
    }

    fn handler(fx: &Fixture) -> ManagePackagesHandler {
        ManagePackagesHandler::new(
            Arc::new(fx.store.clone()),
            Arc::new(fx.store.clone()),
            Arc::new(fx.store.clone()),
            fx.gate(),
            fx.bus.clone(),
        )
    }

    #[tokio::test]
    async fn assign_then_use_until_exhausted() {
        let fx = Fixture::new(Plan::Free).await;
        let client = fx.client("Mo", "mo@example.com").await;
        let handler = handler(&fx);
        let package = handler.create(&fx.ctx, terms("Duo", 2)).await.unwrap();

        let purchase = handler
            .assign(
                &fx.ctx,
                AssignPackageCommand {
                    package_id: package.id,
                    client_id: client.id,
                    expiry_date: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(purchase.sessions_remaining, 2);
        assert!(purchase.expiry_date.is_some());
        assert_eq!(fx.bus.events_of_type("package_purchased").len(), 1);

        assert_eq!(handler.use_session(&fx.ctx, purchase.id).await.unwrap().sessions_remaining, 1);
        assert_eq!(handler.use_session(&fx.ctx, purchase.id).await.unwrap().sessions_remaining, 0);
        let err = handler.use_session(&fx.ctx, purchase.id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::PackageExhausted);
    }

    #[tokio::test]
    async fn expired_purchases_do_not_decrement() {
        let fx = Fixture::new(Plan::Free).await;
        let client = fx.client("Mo", "mo@example.com").await;
        let handler = handler(&fx);
        let package = handler.create(&fx.ctx, terms("Solo", 3)).await.unwrap();

        let purchase = handler
            .assign(
                &fx.ctx,
                AssignPackageCommand {
                    package_id: package.id,
                    client_id: client.id,
                    expiry_date: Some(local_today(fx.ctx.timezone) - Duration::days(1)),
                },
            )
            .await
            .unwrap();
        let err = handler.use_session(&fx.ctx, purchase.id).await.unwrap_err();
        assert_eq!(err.details["reason"], "expired");

        let stored = handler.list_purchases(&fx.ctx, Some(client.id)).await.unwrap();
        assert_eq!(stored[0].sessions_remaining, 3);
    }

    #[tokio::test]
    async fn inactive_packages_cannot_be_assigned() {
        let fx = Fixture::new(Plan::Free).await;
        let client = fx.client("Mo", "mo@example.com").await;
        let handler = handler(&fx);
        let package = handler.create(&fx.ctx, terms("Old", 3)).await.unwrap();
        handler.update(&fx.ctx, package.id, terms("Old", 3), false).await.unwrap();

        let err = handler
            .assign(
                &fx.ctx,
                AssignPackageCommand {
                    package_id: package.id,
                    client_id: client.id,
                    expiry_date: None,
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), crate::domain::foundation::ErrorKind::Validation);
    }
}
