//! HTTP adapter for subscriptions, payment history and the Paddle webhook.

pub mod dto;
pub mod handlers;
pub mod routes;

pub use routes::billing_routes;
