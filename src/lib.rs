//! CoachDesk - multi-tenant back end for independent fitness trainers.
//!
//! Each trainer is a tenant with their own clients, availability,
//! bookings, packages and workflow automations, gated by a subscription
//! plan that Paddle webhooks keep in sync. Superusers run an admin plane
//! across tenants.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
