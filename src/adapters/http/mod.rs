//! HTTP adapter - axum routes over the application handlers.
//!
//! Each area has `dto` (request/response bodies), `handlers` (one async fn
//! per endpoint) and `routes` (the area's `Router`).

pub mod admin;
pub mod billing;
pub mod clients;
pub mod error;
pub mod extract;
pub mod health;
pub mod identity;
pub mod middleware;
pub mod query;
pub mod router;
pub mod scheduling;
pub mod state;
pub mod workflow;

pub use error::{ApiError, ErrorResponse};
pub use router::{api_router, build_router};
pub use state::{AppState, WebhookSettings};
