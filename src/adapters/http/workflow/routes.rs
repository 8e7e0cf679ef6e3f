use axum::{
    routing::{get, post, put},
    Router,
};

use super::handlers::{
    create_template, create_workflow, delete_template, delete_workflow, get_workflow, list_executions,
    list_notifications, list_templates, list_workflows, toggle_workflow, update_template, update_workflow,
};
use crate::adapters::http::state::AppState;

pub fn workflow_routes() -> Router<AppState> {
    Router::new()
        .route("/workflows/workflows", get(list_workflows).post(create_workflow))
        .route(
            "/workflows/workflows/:id",
            get(get_workflow).put(update_workflow).delete(delete_workflow),
        )
        .route("/workflows/workflows/:id/toggle", post(toggle_workflow))
        .route("/workflows/executions", get(list_executions))
        .route("/workflows/templates", get(list_templates).post(create_template))
        .route("/workflows/templates/:id", put(update_template).delete(delete_template))
        .route("/notifications", get(list_notifications))
}
