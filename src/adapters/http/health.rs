//! Liveness and readiness endpoints.
//!
//! `/live` answers as long as the process serves requests. `/ready` runs
//! every registered probe and reports 503 when any dependency is down.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use futures::future::join_all;
use serde::Serialize;

use super::state::AppState;

#[derive(Debug, Clone, Serialize)]
pub struct ProbeReport {
    pub name: &'static str,
    pub healthy: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReadinessReport {
    pub status: &'static str,
    pub checks: Vec<ProbeReport>,
}

impl ReadinessReport {
    pub fn is_ready(&self) -> bool {
        self.checks.iter().all(|c| c.healthy)
    }
}

#[derive(Debug, Clone, Serialize)]
struct LivenessBody {
    status: &'static str,
    version: &'static str,
}

pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(live))
        .route("/live", get(live))
        .route("/ready", get(ready))
}

async fn live() -> impl IntoResponse {
    Json(LivenessBody {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn ready(State(state): State<AppState>) -> impl IntoResponse {
    let report = readiness(&state).await;
    let status = if report.is_ready() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(report))
}

pub async fn readiness(state: &AppState) -> ReadinessReport {
    let checks = join_all(state.probes.iter().map(|probe| async move {
        match probe.check().await {
            Ok(()) => ProbeReport {
                name: probe.name(),
                healthy: true,
                error: None,
            },
            Err(e) => {
                tracing::warn!(probe = probe.name(), error = %e, "readiness probe failed");
                ProbeReport {
                    name: probe.name(),
                    healthy: false,
                    error: Some(e),
                }
            }
        }
    }))
    .await;
    let status = if checks.iter().all(|c| c.healthy) { "ready" } else { "degraded" };
    ReadinessReport { status, checks }
}
