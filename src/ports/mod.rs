//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Store ports
//!
//! - Identity: `PrincipalRepository`, `TrainerRepository`, `TokenStore`
//! - Billing: `SubscriptionRepository`, `BillingLedger`, `WebhookEventRepository`
//! - Scheduling: `AvailabilityRepository`, `BookingRepository`
//! - Clients: `ClientRepository`, `PackageRepository`, `ManualPaymentRepository`
//! - Content and automation: `PageRepository`, `WorkflowRepository`,
//!   `ExecutionRepository`, `TemplateRepository`, `NotificationRepository`
//! - Platform: `AdminRepository`, `UsageReader`, `JobQueue`
//!
//! ## Collaborator ports
//!
//! - `EventPublisher` / `EventSubscriber` - after-commit event bus
//! - `EmailSender` / `SmsSender` - outbound transports
//! - `PasswordHasher`, `HealthProbe`, `JobHandler`

mod admin;
mod billing;
mod clients;
mod event_publisher;
mod event_subscriber;
mod health;
mod identity;
mod job_queue;
mod notification;
mod page_repository;
mod quota;
mod scheduling;
mod usage_reader;
mod workflow;

pub use admin::{AccountFlags, AdminRepository, TrainerOverview};
pub use billing::{BillingChange, BillingLedger, CommitOutcome, SubscriptionRepository, WebhookEventRepository};
pub use clients::{ClientFilter, ClientRepository, ManualPaymentRepository, PackageRepository, SessionUse};
pub use event_publisher::EventPublisher;
pub use event_subscriber::{EventBus, EventHandler, EventSubscriber};
pub use health::HealthProbe;
pub use identity::{PasswordHasher, PrincipalRepository, TokenStore, TrainerRepository};
pub use job_queue::{
    enqueue_now, retry_delay_secs, Job, JobHandler, JobKind, JobQueue, JobStatus, DEFAULT_MAX_ATTEMPTS,
};
pub use notification::{
    EmailSender, NotificationRepository, OutboundMessage, ProviderRef, SmsSender, TransportError,
};
pub use page_repository::PageRepository;
pub use quota::QuotaWrite;
pub use scheduling::{AvailabilityRepository, BookingFilter, BookingRepository, BookingWindow, BookingWrite};
pub use usage_reader::UsageReader;
pub use workflow::{ExecutionRepository, TemplateRepository, WorkflowRepository};
