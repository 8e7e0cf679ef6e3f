//! Route handlers for identity, trainer profile and page endpoints.

use axum::extract::{Json, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use super::dto::{
    AuthResponse, BrandingRequest, CreatePageRequest, CustomDomainRequest, LoginRequest, RegisterRequest,
    UpdateTrainerRequest,
};
use crate::adapters::http::extract::ValidJson;
use crate::adapters::http::error::ApiError;
use crate::adapters::http::middleware::{RequireSession, SelfService, Tenant};
use crate::adapters::http::state::AppState;
use crate::application::handlers::identity::{LoginCommand, RegisterTrainerCommand};
use crate::domain::foundation::PageId;
use crate::domain::identity::PrincipalProfile;

/// POST /users/register
pub async fn register(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let cmd = RegisterTrainerCommand {
        email: req.email,
        password: req.password,
        password_confirmation: req.password_confirm,
        profile: PrincipalProfile {
            username: req.username,
            first_name: req.first_name,
            last_name: req.last_name,
            phone: req.phone,
        },
    };
    let result = state.register_handler().handle(cmd).await?;
    Ok((StatusCode::CREATED, Json(AuthResponse::from(result))))
}

/// POST /users/login
pub async fn login(State(state): State<AppState>, ValidJson(req): ValidJson<LoginRequest>) -> Result<impl IntoResponse, ApiError> {
    let result = state
        .login_handler()
        .handle(LoginCommand {
            email: req.email,
            password: req.password,
        })
        .await?;
    Ok(Json(AuthResponse::from(result)))
}

/// POST /users/logout
pub async fn logout(State(state): State<AppState>, RequireSession(session): RequireSession) -> Result<StatusCode, ApiError> {
    state.logout_handler().handle(&session).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /users/me
pub async fn me(RequireSession(session): RequireSession) -> impl IntoResponse {
    Json(session.principal)
}

/// GET /trainers/me
pub async fn get_trainer(SelfService { trainer, .. }: SelfService) -> impl IntoResponse {
    Json(trainer)
}

/// PATCH /trainers/me
pub async fn update_trainer(
    State(state): State<AppState>,
    SelfService { ctx, .. }: SelfService,
    ValidJson(req): ValidJson<UpdateTrainerRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let trainer = state.trainer_profile_handler().update(&ctx, req.into()).await?;
    Ok(Json(trainer))
}

/// PUT /trainers/me/custom-domain
pub async fn set_custom_domain(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    ValidJson(req): ValidJson<CustomDomainRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let trainer = state.trainer_profile_handler().set_custom_domain(&ctx, req.domain).await?;
    Ok(Json(trainer))
}

/// PUT /trainers/me/branding
pub async fn set_branding(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    ValidJson(req): ValidJson<BrandingRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let trainer = state
        .trainer_profile_handler()
        .set_branding(&ctx, req.brand_color, req.hide_platform_branding)
        .await?;
    Ok(Json(trainer))
}

/// GET /public/trainers/:slug
pub async fn public_trainer(State(state): State<AppState>, Path(slug): Path<String>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.public_lookup().by_slug(&slug).await?))
}

/// GET /public/trainers/:slug/pages/:page_slug
pub async fn public_page(
    State(state): State<AppState>,
    Path((slug, page_slug)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let profile = state.public_lookup().by_slug(&slug).await?;
    let page = state.pages_handler().published(profile.trainer.id, &page_slug).await?;
    Ok(Json(page))
}

/// GET /public/domains/:domain
pub async fn public_domain(State(state): State<AppState>, Path(domain): Path<String>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.public_lookup().by_domain(&domain).await?))
}

/// GET /pages
pub async fn list_pages(State(state): State<AppState>, Tenant(ctx): Tenant) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.pages_handler().list(&ctx).await?))
}

/// POST /pages
pub async fn create_page(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    ValidJson(req): ValidJson<CreatePageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let page = state.pages_handler().create(&ctx, req.into()).await?;
    Ok((StatusCode::CREATED, Json(page)))
}

/// DELETE /pages/:id
pub async fn delete_page(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(id): Path<PageId>,
) -> Result<StatusCode, ApiError> {
    state.pages_handler().delete(&ctx, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
