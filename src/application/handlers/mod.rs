//! Application handlers, one directory per area.
//!
//! Every tenant operation takes an explicit [`TenantContext`] and scopes all
//! reads and writes to `ctx.trainer_id`. Events are published only after the
//! store call that produced them has returned.
//!
//! [`TenantContext`]: crate::domain::identity::TenantContext

pub mod admin;
pub mod billing;
pub mod clients;
pub mod entitlement;
pub mod identity;
pub mod jobs;
pub mod notification;
pub mod pages;
pub mod scheduling;
pub mod workflow;

#[cfg(test)]
pub(crate) mod test_support;
