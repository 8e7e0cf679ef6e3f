//! Route handlers for the admin plane.

use axum::extract::{Json, Path, State};
use axum::response::IntoResponse;

use super::dto::{ImpersonateRequest, RequeueRequest, TrainerSearchQuery, WebhookListQuery};
use crate::adapters::http::billing::dto::WebhookAck;
use crate::adapters::http::extract::{ValidJson, ValidQuery};
use crate::adapters::http::error::ApiError;
use crate::adapters::http::middleware::Superuser;
use crate::adapters::http::query::PageQuery;
use crate::adapters::http::state::AppState;
use crate::application::handlers::admin::BulkActionCommand;
use crate::domain::foundation::{PageRequest, TrainerId};

/// GET /admin/trainers
pub async fn search_trainers(
    State(state): State<AppState>,
    Superuser(actor): Superuser,
    ValidQuery(q): ValidQuery<TrainerSearchQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let search = q.search.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let page = PageRequest::new(q.offset, q.limit);
    Ok(Json(state.admin_trainers_handler().search(&actor, search, page).await?))
}

/// POST /admin/trainers/bulk-action
pub async fn bulk_action(
    State(state): State<AppState>,
    Superuser(actor): Superuser,
    ValidJson(cmd): ValidJson<BulkActionCommand>,
) -> Result<impl IntoResponse, ApiError> {
    if cmd.trainer_ids.is_empty() {
        return Err(ApiError::bad_request("trainer_ids", "at least one trainer id is required"));
    }
    Ok(Json(state.admin_trainers_handler().bulk_action(&actor, cmd).await?))
}

/// POST /admin/trainers/:id/impersonate
pub async fn impersonate(
    State(state): State<AppState>,
    Superuser(actor): Superuser,
    Path(id): Path<TrainerId>,
    body: Option<Json<ImpersonateRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let reason = body.and_then(|Json(req)| req.reason);
    Ok(Json(state.admin_trainers_handler().impersonate(&actor, id, reason).await?))
}

/// POST /admin/trainers/:id/activate-domain
pub async fn activate_domain(
    State(state): State<AppState>,
    Superuser(actor): Superuser,
    Path(id): Path<TrainerId>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.admin_trainers_handler().activate_domain(&actor, id).await?))
}

/// GET /admin/actions
pub async fn list_actions(
    State(state): State<AppState>,
    Superuser(actor): Superuser,
    ValidQuery(page): ValidQuery<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.admin_operations_handler().list_actions(&actor, page.into()).await?))
}

/// GET /admin/webhooks
pub async fn list_webhooks(
    State(state): State<AppState>,
    Superuser(actor): Superuser,
    ValidQuery(q): ValidQuery<WebhookListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = PageRequest::new(q.offset, q.limit);
    let events = state
        .admin_operations_handler()
        .list_webhooks(&actor, q.unprocessed, page)
        .await?;
    Ok(Json(events))
}

/// POST /admin/webhooks/:event_id/replay
pub async fn replay_webhook(
    State(state): State<AppState>,
    Superuser(actor): Superuser,
    Path(event_id): Path<String>,
) -> Result<Json<WebhookAck>, ApiError> {
    let outcome = state.admin_operations_handler().replay_webhook(&actor, &event_id).await?;
    Ok(Json(WebhookAck::from(outcome)))
}

/// POST /admin/notifications/requeue-failed
pub async fn requeue_failed(
    State(state): State<AppState>,
    Superuser(actor): Superuser,
    body: Option<Json<RequeueRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let deliver = body.map(|Json(req)| req.deliver).unwrap_or(false);
    Ok(Json(
        state
            .admin_operations_handler()
            .requeue_failed_notifications(&actor, deliver)
            .await?,
    ))
}
