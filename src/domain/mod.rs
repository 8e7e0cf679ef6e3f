//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (value objects, IDs, errors, events)
//! - `identity` - Principals, trainer profiles, auth tokens, tenant context
//! - `entitlement` - Plans, quotas and feature gates
//! - `billing` - Subscriptions, provider payments, Paddle webhooks
//! - `scheduling` - Availability rules, breaks, slot derivation, bookings
//! - `clients` - Client roster, packages, manual payments
//! - `pages` - Trainer content pages
//! - `workflow` - Tenant events, automation workflows, execution log
//! - `notification` - Outbound message log
//! - `admin` - Superuser audit trail and bulk operations

pub mod admin;
pub mod billing;
pub mod clients;
pub mod entitlement;
pub mod foundation;
pub mod identity;
pub mod notification;
pub mod pages;
pub mod scheduling;
pub mod workflow;
