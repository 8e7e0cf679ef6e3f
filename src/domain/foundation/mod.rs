//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers and error types that form the
//! vocabulary shared by every bounded context.

mod errors;
mod events;
mod ids;
mod money;
mod pagination;
mod scalar;
mod state_machine;
mod timestamp;

pub use errors::{DomainError, ErrorCode, ErrorKind, ValidationError};
pub use events::{DomainEvent, EventEnvelope};
pub use ids::{
    AdminActionId, AvailabilityRuleId, BookingId, BreakId, ClientId, EventId, ExecutionId, JobId,
    ManualPaymentId, NotificationId, PackageId, PackagePurchaseId, PageId, PaymentId, PrincipalId,
    SubscriptionId, TemplateId, TrainerId, WorkflowActionId, WorkflowId,
};
pub use money::{format_cents, parse_decimal_amount, Money};
pub use pagination::{Page, PageRequest, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
pub use scalar::{AttributeMap, Scalar};
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
