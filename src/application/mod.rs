//! Application layer - command and query handlers.
//!
//! Handlers orchestrate domain operations over the ports. Every tenant
//! operation takes an explicit `TenantContext`; events are published only
//! after the store has committed.

pub mod events;
pub mod handlers;
mod stores;

pub use stores::Stores;
