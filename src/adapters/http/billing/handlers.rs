//! Route handlers for billing endpoints.

use axum::body::Bytes;
use axum::extract::{Json, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;

use super::dto::WebhookAck;
use crate::adapters::http::extract::ValidQuery;
use crate::adapters::http::error::ApiError;
use crate::adapters::http::middleware::{SelfService, Tenant};
use crate::adapters::http::query::PageQuery;
use crate::adapters::http::state::AppState;
use crate::application::handlers::entitlement::list_plans;

pub const SIGNATURE_HEADER: &str = "paddle-signature";

/// GET /subscriptions/current
pub async fn current_subscription(
    State(state): State<AppState>,
    SelfService { ctx, .. }: SelfService,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.subscription_summary_handler().handle(&ctx).await?))
}

/// GET /subscriptions/plans
pub async fn plans() -> impl IntoResponse {
    Json(list_plans())
}

/// GET /payments
pub async fn list_payments(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    ValidQuery(page): ValidQuery<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.list_payments_handler().handle(&ctx, page.into()).await?))
}

/// POST /payments/webhooks/paddle
///
/// The body is verified byte-for-byte, so it is taken raw rather than as JSON.
pub async fn paddle_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>, ApiError> {
    let signature = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok());
    let outcome = state.reconciler().apply(&body, signature).await?;
    Ok(Json(WebhookAck::from(outcome)))
}
