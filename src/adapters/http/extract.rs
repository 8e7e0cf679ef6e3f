//! Body and query extractors that reject with the standard error body.
//!
//! axum's own `Json` and `Query` answer a bad payload with a plain-text 422.
//! These wrappers turn the same failures into `VALIDATION_FAILED` (400) with
//! `details.field` naming the offending field when serde reports one.

use async_trait::async_trait;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts, Request};
use axum::http::request::Parts;
use serde::de::DeserializeOwned;

use super::error::ApiError;
use crate::domain::foundation::DomainError;

/// JSON request body.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidJson<T>(pub T);

/// Query string.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidQuery<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match axum::Json::<T>::from_request(req, state).await {
            Ok(axum::Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(rejection.into()),
        }
    }
}

#[async_trait]
impl<S, T> FromRequestParts<S> for ValidQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match axum::extract::Query::<T>::from_request_parts(parts, state).await {
            Ok(axum::extract::Query(value)) => Ok(Self(value)),
            Err(rejection) => Err(rejection.into()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let message = rejection.body_text();
        let field = field_in(&message).unwrap_or("body").to_string();
        ApiError::Domain(DomainError::validation(field, message))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        let message = rejection.body_text();
        let field = field_in(&message).unwrap_or("query").to_string();
        ApiError::Domain(DomainError::validation(field, message))
    }
}

/// serde names the field in backticks: "missing field `client_id`".
fn field_in(message: &str) -> Option<&str> {
    let rest = &message[message.find("field `")? + "field `".len()..];
    rest.split('`').next().filter(|f| !f.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_names_are_lifted_from_serde_messages() {
        assert_eq!(
            field_in("Failed to deserialize the JSON body into the target type: missing field `client_id` at line 1 column 2"),
            Some("client_id")
        );
        assert_eq!(field_in("Expected request with `Content-Type: application/json`"), None);
    }
}
