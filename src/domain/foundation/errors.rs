//! Error types for the domain layer.

use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt;
use thiserror::Error;

/// Errors that occur during value object construction.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationError {
    #[error("Field '{field}' cannot be empty")]
    EmptyField { field: String },

    #[error("Field '{field}' must be between {min} and {max}, got {actual}")]
    OutOfRange {
        field: String,
        min: i64,
        max: i64,
        actual: i64,
    },

    #[error("Field '{field}' has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    /// Creates an empty field validation error.
    pub fn empty_field(field: impl Into<String>) -> Self {
        ValidationError::EmptyField { field: field.into() }
    }

    /// Creates an out of range validation error.
    pub fn out_of_range(field: impl Into<String>, min: i64, max: i64, actual: i64) -> Self {
        ValidationError::OutOfRange {
            field: field.into(),
            min,
            max,
            actual,
        }
    }

    /// Creates an invalid format validation error.
    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Name of the offending field.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::EmptyField { field }
            | ValidationError::OutOfRange { field, .. }
            | ValidationError::InvalidFormat { field, .. } => field,
        }
    }
}

/// Error codes organized by category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Validation errors
    ValidationFailed,
    EmptyField,
    OutOfRange,
    InvalidFormat,

    // Entitlement errors
    QuotaExceeded,
    FeatureNotIncluded,

    // Lookup errors
    NotFound,

    // State errors
    Conflict,
    BookingConflict,
    InvalidStateTransition,
    PackageExhausted,

    // Authorization errors
    Unauthorized,
    Forbidden,
    NotATrainer,
    SubscriptionInactive,

    // Upstream errors
    UpstreamError,

    // Infrastructure errors
    DatabaseError,
    CacheError,
    InternalError,
}

/// Coarse grouping of error codes, used by the transport layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Quota,
    NotFound,
    Conflict,
    Unauthorized,
    Forbidden,
    Upstream,
    Internal,
}

impl ErrorCode {
    /// Returns the category this code belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ErrorCode::ValidationFailed
            | ErrorCode::EmptyField
            | ErrorCode::OutOfRange
            | ErrorCode::InvalidFormat => ErrorKind::Validation,
            ErrorCode::QuotaExceeded | ErrorCode::FeatureNotIncluded => ErrorKind::Quota,
            ErrorCode::NotFound => ErrorKind::NotFound,
            ErrorCode::Conflict
            | ErrorCode::BookingConflict
            | ErrorCode::InvalidStateTransition
            | ErrorCode::PackageExhausted => ErrorKind::Conflict,
            ErrorCode::Unauthorized => ErrorKind::Unauthorized,
            ErrorCode::Forbidden | ErrorCode::NotATrainer | ErrorCode::SubscriptionInactive => {
                ErrorKind::Forbidden
            }
            ErrorCode::UpstreamError => ErrorKind::Upstream,
            ErrorCode::DatabaseError | ErrorCode::CacheError | ErrorCode::InternalError => {
                ErrorKind::Internal
            }
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::ValidationFailed => "VALIDATION_FAILED",
            ErrorCode::EmptyField => "EMPTY_FIELD",
            ErrorCode::OutOfRange => "OUT_OF_RANGE",
            ErrorCode::InvalidFormat => "INVALID_FORMAT",
            ErrorCode::QuotaExceeded => "QUOTA_EXCEEDED",
            ErrorCode::FeatureNotIncluded => "FEATURE_NOT_INCLUDED",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::Conflict => "CONFLICT",
            ErrorCode::BookingConflict => "BOOKING_CONFLICT",
            ErrorCode::InvalidStateTransition => "INVALID_STATE_TRANSITION",
            ErrorCode::PackageExhausted => "PACKAGE_EXHAUSTED",
            ErrorCode::Unauthorized => "UNAUTHORIZED",
            ErrorCode::Forbidden => "FORBIDDEN",
            ErrorCode::NotATrainer => "NOT_A_TRAINER",
            ErrorCode::SubscriptionInactive => "SUBSCRIPTION_INACTIVE",
            ErrorCode::UpstreamError => "UPSTREAM_ERROR",
            ErrorCode::DatabaseError => "DATABASE_ERROR",
            ErrorCode::CacheError => "CACHE_ERROR",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        };
        write!(f, "{}", s)
    }
}

/// Standard domain error with code, message, and optional details.
#[derive(Debug, Clone, PartialEq)]
pub struct DomainError {
    pub code: ErrorCode,
    pub message: String,
    pub details: BTreeMap<String, JsonValue>,
}

impl DomainError {
    /// Creates a new domain error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: BTreeMap::new(),
        }
    }

    /// Creates a validation error for a specific field.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationFailed, message).with_detail("field", field.into())
    }

    /// Creates a not-found error for the named entity.
    pub fn not_found(entity: &str) -> Self {
        Self::new(ErrorCode::NotFound, format!("{} not found", entity))
            .with_detail("entity", entity)
    }

    /// Creates a conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Conflict, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// Creates a database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message)
    }

    /// Adds a detail to the error.
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    /// Returns the coarse category of this error.
    pub fn kind(&self) -> ErrorKind {
        self.code.kind()
    }
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl Error for DomainError {}

impl From<ValidationError> for DomainError {
    fn from(err: ValidationError) -> Self {
        let code = match &err {
            ValidationError::EmptyField { .. } => ErrorCode::EmptyField,
            ValidationError::OutOfRange { .. } => ErrorCode::OutOfRange,
            ValidationError::InvalidFormat { .. } => ErrorCode::InvalidFormat,
        };
        let field = err.field().to_string();
        DomainError::new(code, err.to_string()).with_detail("field", field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_empty_field_displays_correctly() {
        let err = ValidationError::empty_field("email");
        assert_eq!(format!("{}", err), "Field 'email' cannot be empty");
    }

    #[test]
    fn validation_error_out_of_range_displays_correctly() {
        let err = ValidationError::out_of_range("day_of_week", 0, 6, 9);
        assert_eq!(
            format!("{}", err),
            "Field 'day_of_week' must be between 0 and 6, got 9"
        );
    }

    #[test]
    fn domain_error_displays_code_and_message() {
        let err = DomainError::not_found("Booking");
        assert_eq!(format!("{}", err), "[NOT_FOUND] Booking not found");
    }

    #[test]
    fn domain_error_with_detail_accepts_numbers_and_strings() {
        let err = DomainError::new(ErrorCode::QuotaExceeded, "limit reached")
            .with_detail("current", 10u32)
            .with_detail("resource_kind", "clients");

        assert_eq!(err.details.get("current"), Some(&JsonValue::from(10)));
        assert_eq!(
            err.details.get("resource_kind"),
            Some(&JsonValue::from("clients"))
        );
    }

    #[test]
    fn validation_error_converts_with_matching_code() {
        let err: DomainError = ValidationError::invalid_format("brand_color", "invalid hex color").into();
        assert_eq!(err.code, ErrorCode::InvalidFormat);
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.details.get("field"), Some(&JsonValue::from("brand_color")));
    }

    #[test]
    fn error_codes_group_into_kinds() {
        assert_eq!(ErrorCode::BookingConflict.kind(), ErrorKind::Conflict);
        assert_eq!(ErrorCode::QuotaExceeded.kind(), ErrorKind::Quota);
        assert_eq!(ErrorCode::NotATrainer.kind(), ErrorKind::Forbidden);
        assert_eq!(ErrorCode::DatabaseError.kind(), ErrorKind::Internal);
    }
}
