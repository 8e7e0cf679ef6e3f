//! Route handlers for clients, packages and manual payments.

use axum::extract::{Json, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use super::dto::{
    AssignPackageRequest, ClientListQuery, CreateClientRequest, PackageListQuery, PackageRequest, PurchaseListQuery,
    RecordPaymentRequest, RecordPaymentResponse, RevenueQuery, UpdateClientRequest,
};
use crate::adapters::http::extract::{ValidJson, ValidQuery};
use crate::adapters::http::error::ApiError;
use crate::adapters::http::middleware::Tenant;
use crate::adapters::http::state::AppState;
use crate::application::handlers::clients::{AssignPackageCommand, UpdateClientCommand};
use crate::domain::foundation::{ClientId, PackageId, PackagePurchaseId, PageRequest};
use crate::ports::ClientFilter;

// ─── clients ────────────────────────────────────────────────────────────────

/// GET /clients
pub async fn list_clients(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    ValidQuery(q): ValidQuery<ClientListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = ClientFilter {
        is_active: q.is_active,
        search: q.search.filter(|s| !s.trim().is_empty()),
    };
    let page = PageRequest::new(q.offset, q.limit);
    Ok(Json(state.clients_handler().list(&ctx, &filter, page).await?))
}

/// POST /clients
pub async fn create_client(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    ValidJson(req): ValidJson<CreateClientRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let client = state.clients_handler().create(&ctx, req.into()).await?;
    Ok((StatusCode::CREATED, Json(client)))
}

/// GET /clients/:id
pub async fn get_client(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(id): Path<ClientId>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.clients_handler().get(&ctx, id).await?))
}

/// PATCH /clients/:id
pub async fn update_client(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(id): Path<ClientId>,
    ValidJson(req): ValidJson<UpdateClientRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let handler = state.clients_handler();
    let current = handler.get(&ctx, id).await?;
    let cmd = UpdateClientCommand {
        details: req.merged_details(&current),
        is_active: req.is_active,
    };
    Ok(Json(handler.update(&ctx, id, cmd).await?))
}

/// DELETE /clients/:id
pub async fn delete_client(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(id): Path<ClientId>,
) -> Result<StatusCode, ApiError> {
    state.clients_handler().delete(&ctx, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ─── manual payments ────────────────────────────────────────────────────────

/// GET /clients/:id/payments
pub async fn list_client_payments(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(id): Path<ClientId>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.manual_payments_handler().list_for_client(&ctx, id).await?))
}

/// POST /clients/:id/payments
pub async fn record_payment(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(id): Path<ClientId>,
    ValidJson(req): ValidJson<RecordPaymentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (payment, client) = state.manual_payments_handler().record(&ctx, id, req.into()).await?;
    Ok((StatusCode::CREATED, Json(RecordPaymentResponse { payment, client })))
}

/// GET /payments/manual
pub async fn manual_revenue(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    ValidQuery(q): ValidQuery<RevenueQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = PageRequest::new(q.offset, q.limit);
    Ok(Json(state.manual_payments_handler().revenue(&ctx, q.from, q.to, page).await?))
}

// ─── packages ───────────────────────────────────────────────────────────────

/// GET /packages
pub async fn list_packages(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    ValidQuery(q): ValidQuery<PackageListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.packages_handler().list(&ctx, q.active_only).await?))
}

/// POST /packages
pub async fn create_package(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    ValidJson(req): ValidJson<PackageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let package = state.packages_handler().create(&ctx, req.terms()).await?;
    Ok((StatusCode::CREATED, Json(package)))
}

/// PATCH /packages/:id
pub async fn update_package(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(id): Path<PackageId>,
    ValidJson(req): ValidJson<PackageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let package = state
        .packages_handler()
        .update(&ctx, id, req.terms(), req.is_active)
        .await?;
    Ok(Json(package))
}

/// POST /packages/:id/assign-to-client
pub async fn assign_package(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(id): Path<PackageId>,
    ValidJson(req): ValidJson<AssignPackageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let cmd = AssignPackageCommand {
        package_id: id,
        client_id: req.client_id,
        expiry_date: req.expiry_date,
    };
    let purchase = state.packages_handler().assign(&ctx, cmd).await?;
    Ok((StatusCode::CREATED, Json(purchase)))
}

/// GET /client-packages
pub async fn list_purchases(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    ValidQuery(q): ValidQuery<PurchaseListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.packages_handler().list_purchases(&ctx, q.client_id).await?))
}

/// POST /client-packages/:id/use-session
pub async fn use_session(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(id): Path<PackagePurchaseId>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.packages_handler().use_session(&ctx, id).await?))
}
