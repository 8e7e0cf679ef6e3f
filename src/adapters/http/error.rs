//! Maps domain and webhook errors to HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

use crate::domain::billing::WebhookError;
use crate::domain::foundation::{DomainError, ErrorCode, ErrorKind};

/// Body of every error response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub details: BTreeMap<String, JsonValue>,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: BTreeMap::new(),
        }
    }
}

/// Error type returned by every route handler.
#[derive(Debug)]
pub enum ApiError {
    Domain(DomainError),
    Webhook(WebhookError),
}

impl ApiError {
    pub fn unauthorized(message: &str) -> Self {
        Self::Domain(DomainError::new(ErrorCode::Unauthorized, message))
    }

    pub fn bad_request(field: &str, message: impl Into<String>) -> Self {
        Self::Domain(DomainError::validation(field, message))
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self::Domain(err)
    }
}

impl From<WebhookError> for ApiError {
    fn from(err: WebhookError) -> Self {
        Self::Webhook(err)
    }
}

pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::Quota => StatusCode::PAYMENT_REQUIRED,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorKind::Forbidden => StatusCode::FORBIDDEN,
        ErrorKind::Upstream => StatusCode::BAD_GATEWAY,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Domain(err) => {
                let status = status_for(err.kind());
                if status.is_server_error() {
                    tracing::error!(code = %err.code, error = %err.message, "request failed");
                    let body = ErrorResponse::new(err.code.to_string(), "Internal server error");
                    return (status, Json(body)).into_response();
                }
                let body = ErrorResponse {
                    code: err.code.to_string(),
                    message: err.message,
                    details: err.details,
                };
                (status, Json(body)).into_response()
            }
            ApiError::Webhook(err) => {
                let status = err.status_code();
                if status.is_server_error() {
                    tracing::error!(code = err.code(), error = %err, "webhook processing failed");
                } else {
                    tracing::warn!(code = err.code(), error = %err, "webhook rejected");
                }
                (status, Json(ErrorResponse::new(err.code(), err.to_string()))).into_response()
            }
        }
    }
}
