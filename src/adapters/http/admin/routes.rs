use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{
    activate_domain, bulk_action, impersonate, list_actions, list_webhooks, replay_webhook, requeue_failed,
    search_trainers,
};
use crate::adapters::http::state::AppState;

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/trainers", get(search_trainers))
        .route("/admin/trainers/bulk-action", post(bulk_action))
        .route("/admin/trainers/:id/impersonate", post(impersonate))
        .route("/admin/trainers/:id/activate-domain", post(activate_domain))
        .route("/admin/actions", get(list_actions))
        .route("/admin/webhooks", get(list_webhooks))
        .route("/admin/webhooks/:event_id/replay", post(replay_webhook))
        .route("/admin/notifications/requeue-failed", post(requeue_failed))
}
