//! Authentication middleware and extractors for axum.
//!
//! ```text
//! Request → auth_middleware → injects Session into extensions
//!                                   ↓
//!           Handler → Tenant / SelfService / Superuser extractor
//!                     resolves the session into what the route needs
//! ```
//!
//! A request without an `Authorization` header passes through unchanged so
//! public routes share the same stack; a header carrying an unknown,
//! revoked or expired token is rejected here with 401.
//!
//! Accepted header forms:
//! ```text
//! Authorization: Token <opaque>
//! Authorization: Bearer <opaque>
//! ```

use async_trait::async_trait;
use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::super::error::ApiError;
use crate::application::handlers::admin::AdminActor;
use crate::application::handlers::identity::{Session, TenantResolver};
use crate::domain::admin::RequestOrigin;
use crate::domain::identity::{TenantContext, Trainer};

/// Pulls the opaque token out of the `Authorization` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(axum::http::header::AUTHORIZATION)?.to_str().ok()?;
    value
        .strip_prefix("Token ")
        .or_else(|| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Client IP from `X-Forwarded-For` (first hop) or `X-Real-IP`, plus the
/// user agent.
pub fn request_origin(headers: &HeaderMap) -> RequestOrigin {
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok()).map(str::trim);
    let client_ip = header("x-forwarded-for")
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .or_else(|| header("x-real-ip").filter(|v| !v.is_empty()))
        .map(str::to_string);
    RequestOrigin {
        client_ip,
        user_agent: header("user-agent").map(str::to_string),
    }
}

pub async fn auth_middleware(State(resolver): State<TenantResolver>, mut request: Request, next: Next) -> Response {
    let Some(token) = bearer_token(request.headers()).map(str::to_string) else {
        return next.run(request).await;
    };
    match resolver.authenticate(&token).await {
        Ok(session) => {
            request.extensions_mut().insert(session);
            next.run(request).await
        }
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// Any authenticated principal.
#[derive(Debug, Clone)]
pub struct RequireSession(pub Session);

#[async_trait]
impl<S> FromRequestParts<S> for RequireSession
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Session>()
            .cloned()
            .map(RequireSession)
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}

/// Tenant routes: the principal must own a trainer profile.
#[derive(Debug, Clone, Copy)]
pub struct Tenant(pub TenantContext);

#[async_trait]
impl<S> FromRequestParts<S> for Tenant
where
    TenantResolver: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let RequireSession(session) = RequireSession::from_request_parts(parts, state).await?;
        let resolver = TenantResolver::from_ref(state);
        Ok(Tenant(resolver.tenant(&session).await?))
    }
}

/// Self-service routes: a missing trainer profile is created on the fly.
#[derive(Debug, Clone)]
pub struct SelfService {
    pub trainer: Trainer,
    pub ctx: TenantContext,
}

#[async_trait]
impl<S> FromRequestParts<S> for SelfService
where
    TenantResolver: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let RequireSession(session) = RequireSession::from_request_parts(parts, state).await?;
        let resolver = TenantResolver::from_ref(state);
        let (trainer, ctx) = resolver.tenant_or_default(&session).await?;
        Ok(SelfService { trainer, ctx })
    }
}

/// Admin routes: a superuser session acting as itself.
#[derive(Debug, Clone)]
pub struct Superuser(pub AdminActor);

#[async_trait]
impl<S> FromRequestParts<S> for Superuser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let RequireSession(session) = RequireSession::from_request_parts(parts, state).await?;
        let origin = request_origin(&parts.headers);
        Ok(Superuser(AdminActor::from_session(&session, origin)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, Request as HttpRequest};

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn accepts_token_and_bearer_schemes() {
        assert_eq!(bearer_token(&headers(&[("authorization", "Token abc123")])), Some("abc123"));
        assert_eq!(bearer_token(&headers(&[("authorization", "Bearer abc123")])), Some("abc123"));
        assert_eq!(bearer_token(&headers(&[("authorization", "Basic abc123")])), None);
        assert_eq!(bearer_token(&headers(&[("authorization", "Token ")])), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[test]
    fn origin_prefers_first_forwarded_hop() {
        let origin = request_origin(&headers(&[
            ("x-forwarded-for", "203.0.113.7, 10.0.0.1"),
            ("x-real-ip", "10.0.0.2"),
            ("user-agent", "curl/8.4"),
        ]));
        assert_eq!(origin.client_ip.as_deref(), Some("203.0.113.7"));
        assert_eq!(origin.user_agent.as_deref(), Some("curl/8.4"));

        let origin = request_origin(&headers(&[("x-real-ip", "10.0.0.2")]));
        assert_eq!(origin.client_ip.as_deref(), Some("10.0.0.2"));
    }

    #[tokio::test]
    async fn require_session_fails_without_session() {
        let request: HttpRequest<()> = HttpRequest::builder().uri("/users/me").body(()).unwrap();
        let (mut parts, _body) = request.into_parts();
        let result = RequireSession::from_request_parts(&mut parts, &()).await;
        assert!(matches!(result, Err(ApiError::Domain(ref e)) if e.code.to_string() == "UNAUTHORIZED"));
    }
}
