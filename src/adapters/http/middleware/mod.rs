//! HTTP middleware for axum.
//!
//! - `auth` - token authentication middleware and the session, tenant and
//!   superuser extractors built on it

pub mod auth;

pub use auth::{auth_middleware, bearer_token, request_origin, RequireSession, SelfService, Superuser, Tenant};
