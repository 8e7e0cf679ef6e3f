use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{current_subscription, list_payments, paddle_webhook, plans};
use crate::adapters::http::state::AppState;

pub fn billing_routes() -> Router<AppState> {
    Router::new()
        .route("/subscriptions/current", get(current_subscription))
        .route("/subscriptions/plans", get(plans))
        .route("/payments", get(list_payments))
        .route("/payments/webhooks/paddle", post(paddle_webhook))
}
