//! In-memory store implementing every repository port.
//!
//! Used by the test suites and by `COACHDESK__DATABASE__URL`-less local
//! runs. One `RwLock` guards all tables; holding the write guard for the
//! whole operation gives the same serialization the Postgres adapter gets
//! from row and advisory locks.

mod admin;
mod billing;
mod clients;
mod identity;
mod jobs;
mod notifications;
mod scheduling;
mod state;
mod workflow;

pub use state::InMemoryStore;
