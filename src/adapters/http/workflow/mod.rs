//! HTTP adapter for workflows, message templates, the execution log and
//! the notification log.

pub mod dto;
pub mod handlers;
pub mod routes;

pub use routes::workflow_routes;
