//! Route handlers for workflow, template, execution and notification endpoints.

use axum::extract::{Json, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use super::dto::{CreateTemplateRequest, ExecutionQuery, NotificationQuery, UpdateTemplateRequest, WorkflowRequest};
use crate::adapters::http::extract::{ValidJson, ValidQuery};
use crate::adapters::http::error::ApiError;
use crate::adapters::http::middleware::Tenant;
use crate::adapters::http::state::AppState;
use crate::domain::foundation::{PageRequest, TemplateId, WorkflowId};

// ─── workflows ──────────────────────────────────────────────────────────────

/// GET /workflows/workflows
pub async fn list_workflows(State(state): State<AppState>, Tenant(ctx): Tenant) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.workflows_handler().list(&ctx).await?))
}

/// POST /workflows/workflows
pub async fn create_workflow(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    ValidJson(req): ValidJson<WorkflowRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let workflow = state.workflows_handler().create(&ctx, req.into()).await?;
    Ok((StatusCode::CREATED, Json(workflow)))
}

/// GET /workflows/workflows/:id
pub async fn get_workflow(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(id): Path<WorkflowId>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.workflows_handler().get(&ctx, id).await?))
}

/// PUT /workflows/workflows/:id
pub async fn update_workflow(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(id): Path<WorkflowId>,
    ValidJson(req): ValidJson<WorkflowRequest>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.workflows_handler().update(&ctx, id, req.into()).await?))
}

/// DELETE /workflows/workflows/:id
pub async fn delete_workflow(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(id): Path<WorkflowId>,
) -> Result<StatusCode, ApiError> {
    state.workflows_handler().delete(&ctx, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /workflows/workflows/:id/toggle
pub async fn toggle_workflow(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(id): Path<WorkflowId>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.workflows_handler().toggle(&ctx, id).await?))
}

/// GET /workflows/executions
pub async fn list_executions(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    ValidQuery(q): ValidQuery<ExecutionQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = PageRequest::new(q.offset, q.limit);
    let log = state
        .executions_handler()
        .handle(&ctx, q.workflow_id, q.status, page)
        .await?;
    Ok(Json(log))
}

// ─── templates ──────────────────────────────────────────────────────────────

/// GET /workflows/templates
pub async fn list_templates(State(state): State<AppState>, Tenant(ctx): Tenant) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.templates_handler().list(&ctx).await?))
}

/// POST /workflows/templates
pub async fn create_template(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    ValidJson(req): ValidJson<CreateTemplateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (kind, input) = req.split();
    let template = state.templates_handler().create(&ctx, kind, input).await?;
    Ok((StatusCode::CREATED, Json(template)))
}

/// PUT /workflows/templates/:id
pub async fn update_template(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(id): Path<TemplateId>,
    ValidJson(req): ValidJson<UpdateTemplateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.templates_handler().update(&ctx, id, req.into()).await?))
}

/// DELETE /workflows/templates/:id
pub async fn delete_template(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(id): Path<TemplateId>,
) -> Result<StatusCode, ApiError> {
    state.templates_handler().delete(&ctx, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ─── notification log ───────────────────────────────────────────────────────

/// GET /notifications
pub async fn list_notifications(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    ValidQuery(q): ValidQuery<NotificationQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = PageRequest::new(q.offset, q.limit);
    let log = state
        .notifications_handler()
        .handle(&ctx, q.channel, q.status, page)
        .await?;
    Ok(Json(log))
}
