//! HTTP adapter for the client roster, packages and manual payments.

pub mod dto;
pub mod handlers;
pub mod routes;

pub use routes::clients_routes;
