//! Router for client, package and manual payment endpoints.

use axum::{
    routing::{get, patch, post},
    Router,
};

use super::handlers::{
    assign_package, create_client, create_package, delete_client, get_client, list_client_payments, list_clients,
    list_packages, list_purchases, manual_revenue, record_payment, update_client, update_package, use_session,
};
use crate::adapters::http::state::AppState;

pub fn clients_routes() -> Router<AppState> {
    Router::new()
        .route("/clients", get(list_clients).post(create_client))
        .route("/clients/:id", get(get_client).patch(update_client).delete(delete_client))
        .route("/clients/:id/payments", get(list_client_payments).post(record_payment))
        .route("/payments/manual", get(manual_revenue))
        .route("/packages", get(list_packages).post(create_package))
        .route("/packages/:id", patch(update_package))
        .route("/packages/:id/assign-to-client", post(assign_package))
        .route("/client-packages", get(list_purchases))
        .route("/client-packages/:id/use-session", post(use_session))
}
