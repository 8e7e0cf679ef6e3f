//! Bundle of store port handles.

use std::sync::Arc;

use crate::ports::{
    AdminRepository, AvailabilityRepository, BillingLedger, BookingRepository, ClientRepository,
    ExecutionRepository, JobQueue, ManualPaymentRepository, NotificationRepository,
    PackageRepository, PageRepository, PrincipalRepository, SubscriptionRepository,
    TemplateRepository, TokenStore, TrainerRepository, UsageReader, WebhookEventRepository,
    WorkflowRepository,
};

/// One `Arc<dyn _>` per store port, cheap to clone into handlers.
///
/// Both store adapters implement every port, so the bundle is normally
/// built from a single store with `Stores::from_store`.
#[derive(Clone)]
pub struct Stores {
    pub principals: Arc<dyn PrincipalRepository>,
    pub trainers: Arc<dyn TrainerRepository>,
    pub tokens: Arc<dyn TokenStore>,
    pub subscriptions: Arc<dyn SubscriptionRepository>,
    pub ledger: Arc<dyn BillingLedger>,
    pub webhook_events: Arc<dyn WebhookEventRepository>,
    pub availability: Arc<dyn AvailabilityRepository>,
    pub bookings: Arc<dyn BookingRepository>,
    pub clients: Arc<dyn ClientRepository>,
    pub packages: Arc<dyn PackageRepository>,
    pub manual_payments: Arc<dyn ManualPaymentRepository>,
    pub pages: Arc<dyn PageRepository>,
    pub workflows: Arc<dyn WorkflowRepository>,
    pub executions: Arc<dyn ExecutionRepository>,
    pub templates: Arc<dyn TemplateRepository>,
    pub notifications: Arc<dyn NotificationRepository>,
    pub admin: Arc<dyn AdminRepository>,
    pub usage: Arc<dyn UsageReader>,
    pub jobs: Arc<dyn JobQueue>,
}

impl Stores {
    pub fn from_store<S>(store: S) -> Self
    where
        S: PrincipalRepository
            + TrainerRepository
            + TokenStore
            + SubscriptionRepository
            + BillingLedger
            + WebhookEventRepository
            + AvailabilityRepository
            + BookingRepository
            + ClientRepository
            + PackageRepository
            + ManualPaymentRepository
            + PageRepository
            + WorkflowRepository
            + ExecutionRepository
            + TemplateRepository
            + NotificationRepository
            + AdminRepository
            + UsageReader
            + JobQueue
            + 'static,
    {
        let store = Arc::new(store);
        Self {
            principals: store.clone(),
            trainers: store.clone(),
            tokens: store.clone(),
            subscriptions: store.clone(),
            ledger: store.clone(),
            webhook_events: store.clone(),
            availability: store.clone(),
            bookings: store.clone(),
            clients: store.clone(),
            packages: store.clone(),
            manual_payments: store.clone(),
            pages: store.clone(),
            workflows: store.clone(),
            executions: store.clone(),
            templates: store.clone(),
            notifications: store.clone(),
            admin: store.clone(),
            usage: store.clone(),
            jobs: store,
        }
    }
}
