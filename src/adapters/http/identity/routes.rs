//! Router for identity, trainer profile, public lookup and page endpoints.

use axum::{
    routing::{delete, get, post, put},
    Router,
};

use super::handlers::{
    create_page, delete_page, get_trainer, list_pages, login, logout, me, public_domain, public_page,
    public_trainer, register, set_branding, set_custom_domain, update_trainer,
};
use crate::adapters::http::state::AppState;

pub fn identity_routes() -> Router<AppState> {
    Router::new()
        // Accounts
        .route("/users/register", post(register))
        .route("/users/login", post(login))
        .route("/users/logout", post(logout))
        .route("/users/me", get(me))
        // Own profile
        .route("/trainers/me", get(get_trainer).patch(update_trainer))
        .route("/trainers/me/custom-domain", put(set_custom_domain))
        .route("/trainers/me/branding", put(set_branding))
        // Public, no token
        .route("/public/trainers/:slug", get(public_trainer))
        .route("/public/trainers/:slug/pages/:page_slug", get(public_page))
        .route("/public/domains/:domain", get(public_domain))
        // Pages
        .route("/pages", get(list_pages).post(create_page))
        .route("/pages/:id", delete(delete_page))
}
