//! Shared application state and handler factories.

use std::sync::Arc;

use axum::extract::FromRef;

use crate::application::handlers::admin::{AdminOperationsHandler, AdminTrainersHandler};
use crate::application::handlers::billing::{BillingReconciler, ListPaymentsHandler};
use crate::application::handlers::clients::{ManageClientsHandler, ManagePackagesHandler, ManualPaymentsHandler};
use crate::application::handlers::entitlement::{EntitlementGate, GetSubscriptionSummaryHandler};
use crate::application::handlers::identity::{
    LoginHandler, LogoutHandler, PublicTrainerLookup, RegisterTrainerHandler, TenantResolver, TrainerProfileHandler,
};
use crate::application::handlers::notification::{ListNotificationsHandler, NotificationMaintenance};
use crate::application::handlers::pages::ManagePagesHandler;
use crate::application::handlers::scheduling::{
    AvailableSlotsHandler, CreateBookingHandler, ListBookingsHandler, ManageAvailabilityHandler,
    RescheduleBookingHandler, TransitionBookingHandler,
};
use crate::application::handlers::workflow::{ListExecutionsHandler, ManageTemplatesHandler, ManageWorkflowsHandler};
use crate::application::Stores;
use crate::domain::billing::PriceCatalog;
use crate::domain::identity::TokenIssuer;
use crate::ports::{EventPublisher, HealthProbe, PasswordHasher};

const DEFAULT_WEBHOOK_RETENTION_DAYS: i64 = 90;
const DEFAULT_IMPERSONATION_MINUTES: i64 = 60;

/// Paddle settings the reconciler needs.
#[derive(Debug, Clone, Default)]
pub struct WebhookSettings {
    pub secret: Option<String>,
    pub catalog: PriceCatalog,
}

/// Everything route handlers need, cloned per request.
///
/// Application handlers are cheap to build, so they are created on demand
/// from the shared ports instead of being stored.
#[derive(Clone)]
pub struct AppState {
    pub stores: Stores,
    pub publisher: Arc<dyn EventPublisher>,
    pub hasher: Arc<dyn PasswordHasher>,
    pub issuer: TokenIssuer,
    pub resolver: TenantResolver,
    pub webhooks: WebhookSettings,
    pub probes: Arc<Vec<Arc<dyn HealthProbe>>>,
    pub webhook_retention_days: i64,
    pub impersonation_minutes: i64,
}

impl AppState {
    pub fn new(
        stores: Stores,
        publisher: Arc<dyn EventPublisher>,
        hasher: Arc<dyn PasswordHasher>,
        issuer: TokenIssuer,
    ) -> Self {
        let resolver = TenantResolver::new(
            stores.tokens.clone(),
            stores.principals.clone(),
            stores.trainers.clone(),
            issuer.clone(),
        );
        Self {
            stores,
            publisher,
            hasher,
            issuer,
            resolver,
            webhooks: WebhookSettings::default(),
            probes: Arc::new(Vec::new()),
            webhook_retention_days: DEFAULT_WEBHOOK_RETENTION_DAYS,
            impersonation_minutes: DEFAULT_IMPERSONATION_MINUTES,
        }
    }

    pub fn with_webhooks(mut self, webhooks: WebhookSettings) -> Self {
        self.webhooks = webhooks;
        self
    }

    pub fn with_probes(mut self, probes: Vec<Arc<dyn HealthProbe>>) -> Self {
        self.probes = Arc::new(probes);
        self
    }

    pub fn with_webhook_retention_days(mut self, days: i64) -> Self {
        self.webhook_retention_days = days;
        self
    }

    pub fn with_impersonation_minutes(mut self, minutes: i64) -> Self {
        self.impersonation_minutes = minutes;
        self
    }

    pub fn gate(&self) -> EntitlementGate {
        EntitlementGate::new(self.stores.subscriptions.clone(), self.stores.usage.clone())
    }

    // identity

    pub fn register_handler(&self) -> RegisterTrainerHandler {
        RegisterTrainerHandler::new(
            self.stores.principals.clone(),
            self.stores.tokens.clone(),
            self.hasher.clone(),
            self.issuer.clone(),
        )
    }

    pub fn login_handler(&self) -> LoginHandler {
        LoginHandler::new(
            self.stores.principals.clone(),
            self.stores.trainers.clone(),
            self.stores.tokens.clone(),
            self.hasher.clone(),
            self.issuer.clone(),
        )
    }

    pub fn logout_handler(&self) -> LogoutHandler {
        LogoutHandler::new(self.stores.tokens.clone())
    }

    pub fn trainer_profile_handler(&self) -> TrainerProfileHandler {
        TrainerProfileHandler::new(self.stores.trainers.clone(), self.gate())
    }

    pub fn public_lookup(&self) -> PublicTrainerLookup {
        PublicTrainerLookup::new(self.stores.trainers.clone(), self.stores.packages.clone())
    }

    pub fn pages_handler(&self) -> ManagePagesHandler {
        ManagePagesHandler::new(self.stores.pages.clone(), self.gate())
    }

    // scheduling

    pub fn availability_handler(&self) -> ManageAvailabilityHandler {
        ManageAvailabilityHandler::new(self.stores.availability.clone(), self.gate())
    }

    pub fn available_slots_handler(&self) -> AvailableSlotsHandler {
        AvailableSlotsHandler::new(
            self.stores.trainers.clone(),
            self.stores.availability.clone(),
            self.stores.bookings.clone(),
        )
    }

    pub fn create_booking_handler(&self) -> CreateBookingHandler {
        CreateBookingHandler::new(
            self.stores.bookings.clone(),
            self.stores.clients.clone(),
            self.stores.trainers.clone(),
            self.gate(),
            self.publisher.clone(),
        )
    }

    pub fn list_bookings_handler(&self) -> ListBookingsHandler {
        ListBookingsHandler::new(self.stores.bookings.clone())
    }

    pub fn reschedule_booking_handler(&self) -> RescheduleBookingHandler {
        RescheduleBookingHandler::new(self.stores.bookings.clone(), self.gate())
    }

    pub fn transition_booking_handler(&self) -> TransitionBookingHandler {
        TransitionBookingHandler::new(
            self.stores.bookings.clone(),
            self.stores.clients.clone(),
            self.stores.trainers.clone(),
            self.stores.jobs.clone(),
            self.gate(),
            self.publisher.clone(),
        )
    }

    // clients

    pub fn clients_handler(&self) -> ManageClientsHandler {
        ManageClientsHandler::new(
            self.stores.clients.clone(),
            self.stores.trainers.clone(),
            self.gate(),
            self.publisher.clone(),
        )
    }

    pub fn packages_handler(&self) -> ManagePackagesHandler {
        ManagePackagesHandler::new(
            self.stores.packages.clone(),
            self.stores.clients.clone(),
            self.stores.trainers.clone(),
            self.gate(),
            self.publisher.clone(),
        )
    }

    pub fn manual_payments_handler(&self) -> ManualPaymentsHandler {
        ManualPaymentsHandler::new(
            self.stores.manual_payments.clone(),
            self.stores.clients.clone(),
            self.stores.trainers.clone(),
            self.gate(),
            self.publisher.clone(),
        )
    }

    // billing

    pub fn subscription_summary_handler(&self) -> GetSubscriptionSummaryHandler {
        GetSubscriptionSummaryHandler::new(self.stores.subscriptions.clone(), self.stores.usage.clone())
    }

    pub fn list_payments_handler(&self) -> ListPaymentsHandler {
        ListPaymentsHandler::new(self.stores.ledger.clone())
    }

    pub fn reconciler(&self) -> BillingReconciler {
        BillingReconciler::new(
            self.stores.webhook_events.clone(),
            self.stores.ledger.clone(),
            self.stores.subscriptions.clone(),
            self.stores.trainers.clone(),
            self.publisher.clone(),
            self.webhooks.secret.clone(),
            self.webhooks.catalog.clone(),
        )
    }

    // workflows

    pub fn workflows_handler(&self) -> ManageWorkflowsHandler {
        ManageWorkflowsHandler::new(self.stores.workflows.clone(), self.stores.templates.clone(), self.gate())
    }

    pub fn templates_handler(&self) -> ManageTemplatesHandler {
        ManageTemplatesHandler::new(self.stores.templates.clone(), self.stores.workflows.clone(), self.gate())
    }

    pub fn executions_handler(&self) -> ListExecutionsHandler {
        ListExecutionsHandler::new(self.stores.executions.clone())
    }

    pub fn notifications_handler(&self) -> ListNotificationsHandler {
        ListNotificationsHandler::new(self.stores.notifications.clone())
    }

    pub fn notification_maintenance(&self) -> NotificationMaintenance {
        NotificationMaintenance::new(
            self.stores.notifications.clone(),
            self.stores.webhook_events.clone(),
            self.webhook_retention_days,
        )
    }

    // admin

    pub fn admin_trainers_handler(&self) -> AdminTrainersHandler {
        AdminTrainersHandler::new(
            self.stores.admin.clone(),
            self.stores.trainers.clone(),
            self.stores.tokens.clone(),
            self.issuer.clone(),
            self.publisher.clone(),
        )
        .with_impersonation_minutes(self.impersonation_minutes)
    }

    pub fn admin_operations_handler(&self) -> AdminOperationsHandler {
        AdminOperationsHandler::new(
            self.stores.admin.clone(),
            self.stores.webhook_events.clone(),
            Arc::new(self.reconciler()),
            Arc::new(self.notification_maintenance()),
            self.stores.jobs.clone(),
        )
    }
}

impl FromRef<AppState> for TenantResolver {
    fn from_ref(state: &AppState) -> Self {
        state.resolver.clone()
    }
}
