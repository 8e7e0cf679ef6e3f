//! HTTP adapter for accounts, trainer profiles, public lookup and pages.
//!
//! - `POST /users/register`, `POST /users/login`, `POST /users/logout`, `GET /users/me`
//! - `GET|PATCH /trainers/me`, `PUT /trainers/me/custom-domain`, `PUT /trainers/me/branding`
//! - `GET /public/trainers/:slug`, `GET /public/trainers/:slug/pages/:page_slug`,
//!   `GET /public/domains/:domain`
//! - `GET|POST /pages`, `DELETE /pages/:id`

pub mod dto;
pub mod handlers;
pub mod routes;

pub use routes::identity_routes;
