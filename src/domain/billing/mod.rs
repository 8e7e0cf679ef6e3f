//! Billing domain - subscriptions, provider payments and webhook handling.

mod paddle_event;
mod payment;
mod status;
mod subscription;
mod webhook_errors;
mod webhook_event;
mod webhook_verifier;

pub use paddle_event::{
    PaddleEvent, PaddleEventKind, PriceCatalog, SubscriptionSnapshot, TransactionSnapshot,
};
pub use payment::{Payment, PaymentStatus};
pub use status::SubscriptionStatus;
pub use subscription::Subscription;
pub use webhook_errors::WebhookError;
pub use webhook_event::WebhookEvent;
pub use webhook_verifier::{signature_header, PaddleWebhookVerifier, SignatureHeader};
