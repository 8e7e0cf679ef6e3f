//! Billing handlers - provider webhook reconciliation and payment history.

mod payments;
mod reconcile;

pub use payments::ListPaymentsHandler;
pub use reconcile::{BillingReconciler, ReconcileOutcome};
