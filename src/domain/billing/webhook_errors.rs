//! Errors raised while handling billing webhooks.

use http::StatusCode;
use thiserror::Error;

use crate::domain::foundation::DomainError;

/// Errors that occur during webhook processing.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Webhooks are not configured on this deployment.
    #[error("Webhook secret not configured")]
    NotConfigured,

    /// Signature header missing or verification failed.
    #[error("Invalid signature")]
    InvalidSignature,

    /// Signature timestamp is older than the accepted window.
    #[error("Timestamp out of range")]
    TimestampOutOfRange,

    /// Signature timestamp is in the future beyond clock skew tolerance.
    #[error("Invalid timestamp")]
    InvalidTimestamp,

    /// Payload or signature header could not be parsed.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// A required field is absent from the payload.
    #[error("Missing field: {0}")]
    MissingField(&'static str),

    /// No trainer could be matched to the event.
    #[error("Trainer not resolvable for {0}")]
    TrainerNotResolvable(String),

    /// Stored event not found (operator replay).
    #[error("Webhook event not found")]
    EventNotFound,

    /// Persisting the outcome failed.
    #[error("Database error: {0}")]
    Database(String),
}

impl WebhookError {
    /// Returns true if the provider should retry delivery.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            WebhookError::Database(_) | WebhookError::TrainerNotResolvable(_)
        )
    }

    /// Maps the error to an HTTP status code. 5xx makes the provider retry.
    pub fn status_code(&self) -> StatusCode {
        match self {
            WebhookError::NotConfigured => StatusCode::SERVICE_UNAVAILABLE,
            WebhookError::InvalidSignature | WebhookError::TimestampOutOfRange => {
                StatusCode::UNAUTHORIZED
            }
            WebhookError::InvalidTimestamp
            | WebhookError::ParseError(_)
            | WebhookError::MissingField(_) => StatusCode::BAD_REQUEST,
            WebhookError::EventNotFound => StatusCode::NOT_FOUND,
            WebhookError::TrainerNotResolvable(_) | WebhookError::Database(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Stable error code for response bodies.
    pub fn code(&self) -> &'static str {
        match self {
            WebhookError::NotConfigured => "WEBHOOK_NOT_CONFIGURED",
            WebhookError::InvalidSignature => "INVALID_SIGNATURE",
            WebhookError::TimestampOutOfRange => "TIMESTAMP_OUT_OF_RANGE",
            WebhookError::InvalidTimestamp => "INVALID_TIMESTAMP",
            WebhookError::ParseError(_) => "PARSE_ERROR",
            WebhookError::MissingField(_) => "MISSING_FIELD",
            WebhookError::TrainerNotResolvable(_) => "TRAINER_NOT_RESOLVABLE",
            WebhookError::EventNotFound => "NOT_FOUND",
            WebhookError::Database(_) => "DATABASE_ERROR",
        }
    }
}

impl From<DomainError> for WebhookError {
    fn from(err: DomainError) -> Self {
        WebhookError::Database(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_failures_are_401_and_final() {
        assert_eq!(WebhookError::InvalidSignature.status_code(), StatusCode::UNAUTHORIZED);
        assert!(!WebhookError::InvalidSignature.is_retryable());
    }

    #[test]
    fn malformed_payloads_are_400() {
        assert_eq!(
            WebhookError::MissingField("data.id").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            format!("{}", WebhookError::MissingField("data.id")),
            "Missing field: data.id"
        );
    }

    #[test]
    fn processing_failures_are_retryable_500s() {
        let err = WebhookError::Database("connection reset".into());
        assert!(err.is_retryable());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
