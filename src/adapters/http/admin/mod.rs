//! HTTP adapter for the superuser admin plane. Every route here extracts
//! [`Superuser`](crate::adapters::http::middleware::Superuser).

pub mod dto;
pub mod handlers;
pub mod routes;

pub use routes::admin_routes;
