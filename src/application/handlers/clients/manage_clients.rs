//! ManageClientsHandler - client CRUD with the `clients` quota.

use std::sync::Arc;

use crate::application::events::publish_after_commit;
use crate::application::handlers::entitlement::EntitlementGate;
use crate::domain::clients::{Client, ClientDetails};
use crate::domain::entitlement::ResourceKind;
use crate::domain::foundation::{ClientId, DomainError, Page, PageRequest, Timestamp};
use crate::domain::identity::TenantContext;
use crate::domain::workflow::TenantEvent;
use crate::ports::{ClientFilter, ClientRepository, EventPublisher, TrainerRepository};

#[derive(Debug, Clone, Default)]
pub struct UpdateClientCommand {
    pub details: Option<ClientDetails>,
    pub is_active: Option<bool>,
}

pub struct ManageClientsHandler {
    clients: Arc<dyn ClientRepository>,
    trainers: Arc<dyn TrainerRepository>,
    gate: EntitlementGate,
    publisher: Arc<dyn EventPublisher>,
}

impl ManageClientsHandler {
    pub fn new(
        clients: Arc<dyn ClientRepository>,
        trainers: Arc<dyn TrainerRepository>,
        gate: EntitlementGate,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            clients,
            trainers,
            gate,
            publisher,
        }
    }

    pub async fn list(&self, ctx: &TenantContext, filter: &ClientFilter, page: PageRequest) -> Result<Page<Client>, DomainError> {
        self.clients.list(ctx.trainer_id, filter, page).await
    }

    pub async fn get(&self, ctx: &TenantContext, id: ClientId) -> Result<Client, DomainError> {
        self.clients
            .find(ctx.trainer_id, id)
            .await?
            .ok_or_else(|| DomainError::not_found("client"))
    }

    pub async fn create(&self, ctx: &TenantContext, details: ClientDetails) -> Result<Client, DomainError> {
        self.gate.check_create(ctx, ResourceKind::Clients).await?;
        let now = Timestamp::now();
        let client = Client::new(ctx.trainer_id, details, now)?;

        self.clients
            .insert(&client, self.gate.enforces_quota(ctx))
            .await?
            .into_result()?;

        if let Some(trainer) = self.trainers.find_by_id(ctx.trainer_id).await? {
            publish_after_commit(self.publisher.as_ref(), vec![TenantEvent::client_created(&client, &trainer, now)]).await;
        }
        Ok(client)
    }

    /// Reactivating a client consumes quota like a create.
    pub async fn update(&self, ctx: &TenantContext, id: ClientId, cmd: UpdateClientCommand) -> Result<Client, DomainError> {
        self.gate.ensure_writable(ctx).await?;
        let mut client = self.get(ctx, id).await?;
        let now = Timestamp::now();

        if let Some(details) = cmd.details {
            client.update_details(details, now)?;
        }
        let reactivating = cmd.is_active == Some(true) && !client.is_active;
        if let Some(active) = cmd.is_active {
            client.set_active(active, now);
        }
        if reactivating {
            self.gate.check_create(ctx, ResourceKind::Clients).await?;
        }

        self.clients
            .update(&client, self.gate.enforces_quota(ctx))
            .await?
            .into_result()?;
        Ok(client)
    }

    pub async fn delete(&self, ctx: &TenantContext, id: ClientId) -> Result<(), DomainError> {
        self.gate.ensure_writable(ctx).await?;
        if !self.clients.delete(ctx.trainer_id, id).await? {
            return Err(DomainError::not_found("client"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::test_support::Fixture;
    use crate::domain::entitlement::Plan;
    use crate::domain::foundation::{AttributeMap, ErrorCode};

    fn details(n: usize) -> ClientDetails {
        ClientDetails {
            name: format!("Client {}", n),
            email: format!("client{}@example.com", n),
            phone: None,
            fitness_level: None,
            goals: vec!["strength".into()],
            preferences: AttributeMap::new(),
            notes: None,
        }
    }

    fn handler(fx: &Fixture) -> ManageClientsHandler {
        ManageClientsHandler::new(Arc::new(fx.store.clone()), Arc::new(fx.store.clone()), fx.gate(), fx.bus.clone())
    }

    #[tokio::test]
    async fn free_plan_stops_at_ten_active_clients() {
        let fx = Fixture::new(Plan::Free).await;
        let handler = handler(&fx);
        for n in 0..10 {
            handler.create(&fx.ctx, details(n)).await.unwrap();
        }

        let err = handler.create(&fx.ctx, details(10)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::QuotaExceeded);
        assert_eq!(err.details["current"], 10);
        assert_eq!(err.details["limit"], 10);
        assert_eq!(err.details["required_plan"], "pro");
        assert_eq!(fx.bus.events_of_type("client_created").len(), 10);
    }

    #[tokio::test]
    async fn reactivation_counts_against_quota() {
        let fx = Fixture::new(Plan::Free).await;
        let handler = handler(&fx);
        let mut created = Vec::new();
        for n in 0..10 {
            created.push(handler.create(&fx.ctx, details(n)).await.unwrap());
        }

        let deactivate = UpdateClientCommand {
            is_active: Some(false),
            ..Default::default()
        };
        handler.update(&fx.ctx, created[0].id, deactivate).await.unwrap();
        handler.create(&fx.ctx, details(10)).await.unwrap();

        let reactivate = UpdateClientCommand {
            is_active: Some(true),
            ..Default::default()
        };
        let err = handler.update(&fx.ctx, created[0].id, reactivate).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::QuotaExceeded);
    }

    #[tokio::test]
    async fn superusers_bypass_quota() {
        let fx = Fixture::new(Plan::Free).await;
        let handler = handler(&fx);
        let mut admin = fx.ctx;
        admin.is_superuser = true;
        for n in 0..12 {
            handler.create(&admin, details(n)).await.unwrap();
        }
        let page = handler.list(&fx.ctx, &ClientFilter::default(), PageRequest::default()).await.unwrap();
        assert_eq!(page.total, 12);
    }

    #[tokio::test]
    async fn duplicate_email_within_tenant_conflicts() {
        let fx = Fixture::new(Plan::Free).await;
        let handler = handler(&fx);
        handler.create(&fx.ctx, details(1)).await.unwrap();
        let err = handler.create(&fx.ctx, details(1)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Conflict);
    }
}
