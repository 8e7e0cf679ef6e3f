//! Fixtures shared by handler unit tests.

use std::sync::Arc;

use crate::adapters::events::LocalEventBus;
use crate::adapters::memory::InMemoryStore;
use crate::application::handlers::entitlement::EntitlementGate;
use crate::domain::billing::Subscription;
use crate::domain::clients::{Client, ClientDetails};
use crate::domain::entitlement::Plan;
use crate::domain::foundation::{AttributeMap, Timestamp};
use crate::domain::identity::{Principal, PrincipalProfile, TenantContext, Trainer};
use crate::ports::{ClientRepository, PrincipalRepository};

pub struct Fixture {
    pub store: InMemoryStore,
    pub bus: Arc<LocalEventBus>,
    pub trainer: Trainer,
    pub ctx: TenantContext,
}

impl Fixture {
    pub async fn new(plan: Plan) -> Self {
        let store = InMemoryStore::new();
        let (trainer, ctx) = trainer_account(&store, "coach@example.com", plan).await;
        Self {
            store,
            bus: Arc::new(LocalEventBus::with_capture()),
            trainer,
            ctx,
        }
    }

    pub fn gate(&self) -> EntitlementGate {
        EntitlementGate::new(Arc::new(self.store.clone()), Arc::new(self.store.clone()))
    }

    pub async fn client(&self, name: &str, email: &str) -> Client {
        active_client(&self.store, &self.ctx, name, email).await
    }
}

pub async fn trainer_account(store: &InMemoryStore, email: &str, plan: Plan) -> (Trainer, TenantContext) {
    let now = Timestamp::now();
    let principal = Principal::new_trainer(
        email.to_string(),
        "hash".to_string(),
        PrincipalProfile {
            username: None,
            first_name: "Alex".to_string(),
            last_name: "Trainer".to_string(),
            phone: None,
        },
        now,
    );
    let trainer = Trainer::for_principal(&principal, now);
    let mut subscription = Subscription::free(trainer.id, now);
    subscription.plan = plan;
    store
        .create_trainer_account(&principal, &trainer, &subscription)
        .await
        .unwrap();
    let ctx = TenantContext::new(principal.id, trainer.id, trainer.timezone);
    (trainer, ctx)
}

pub async fn active_client(store: &InMemoryStore, ctx: &TenantContext, name: &str, email: &str) -> Client {
    let client = Client::new(
        ctx.trainer_id,
        ClientDetails {
            name: name.to_string(),
            email: email.to_string(),
            phone: Some("+15550100".to_string()),
            fitness_level: None,
            goals: Vec::new(),
            preferences: AttributeMap::new(),
            notes: None,
        },
        Timestamp::now(),
    )
    .unwrap();
    ClientRepository::insert(store, &client, false).await.unwrap();
    client
}
