//! Top-level router: every route area behind the session middleware and
//! the shared tower-http stack.

use axum::http::{HeaderName, HeaderValue, Method};
use axum::middleware::from_fn_with_state;
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use super::admin::admin_routes;
use super::billing::billing_routes;
use super::clients::clients_routes;
use super::health::health_routes;
use super::identity::identity_routes;
use super::middleware::auth_middleware;
use super::scheduling::scheduling_routes;
use super::state::AppState;
use super::workflow::workflow_routes;
use crate::config::ServerConfig;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// API routes without the outer layers. Tests drive this directly.
pub fn api_router(state: AppState) -> Router {
    Router::new()
        .merge(identity_routes())
        .merge(scheduling_routes())
        .merge(clients_routes())
        .merge(billing_routes())
        .merge(workflow_routes())
        .merge(admin_routes())
        .merge(health_routes())
        .layer(from_fn_with_state(state.resolver.clone(), auth_middleware))
        .with_state(state)
}

pub fn build_router(state: AppState, server: &ServerConfig) -> Router {
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);
    api_router(state)
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(server.request_timeout()))
        .layer(cors_layer(server))
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
}

/// Any origin outside production; otherwise only the configured list.
fn cors_layer(server: &ServerConfig) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any);

    let origins: Vec<HeaderValue> = server
        .cors_origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();
    if origins.is_empty() && !server.is_production() {
        base.allow_origin(Any)
    } else {
        base.allow_origin(origins)
    }
}
