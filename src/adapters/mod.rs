//! Adapters - implementations of the port interfaces.
//!
//! - `postgres` / `memory` - the two store backends
//! - `events` - in-process event bus
//! - `jobs` - durable job runner and periodic scheduler
//! - `notifications` - SendGrid and Twilio transports
//! - `auth` - Argon2 password hashing
//! - `health` - readiness probes
//! - `http` - the axum API

pub mod auth;
pub mod events;
pub mod health;
pub mod http;
pub mod jobs;
pub mod memory;
pub mod notifications;
pub mod postgres;
