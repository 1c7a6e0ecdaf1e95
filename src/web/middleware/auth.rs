//! Identity middleware and extractors.
//!
//! The `identity_layer` middleware injects the shared resolver into the
//! request extensions; the extractors below read the session token (Bearer
//! header first, then the session cookie) and the guest id header.

use axum::{
    async_trait,
    body::Body,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, Request},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;

use crate::identity::{Identity, IdentityResolver, GUEST_ID_HEADER, SESSION_COOKIE};
use crate::web::error::ApiError;

/// Session token carried by the request, if any.
pub fn session_token(parts: &Parts) -> Option<String> {
    let bearer = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());

    bearer.or_else(|| {
        CookieJar::from_headers(&parts.headers)
            .get(SESSION_COOKIE)
            .map(|c| c.value().to_string())
            .filter(|t| !t.is_empty())
    })
}

fn guest_id(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(GUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
}

fn resolve(parts: &Parts) -> Result<Option<Identity>, ApiError> {
    let resolver = parts
        .extensions
        .get::<Arc<IdentityResolver>>()
        .ok_or_else(|| ApiError::internal("Identity resolver not configured"))?;

    let token = session_token(parts);
    Ok(resolver.resolve(token.as_deref(), guest_id(parts)))
}

/// Identity of the caller, if it presented one.
///
/// Never rejects a request for a missing or invalid identity; uploads and
/// recipient endpoints work anonymously.
#[derive(Debug, Clone)]
pub struct CurrentIdentity(pub Option<Identity>);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentIdentity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(CurrentIdentity(resolve(parts)?))
    }
}

/// Identity of the caller, required.
#[derive(Debug, Clone)]
pub struct RequireIdentity(pub Identity);

#[async_trait]
impl<S> FromRequestParts<S> for RequireIdentity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        resolve(parts)?
            .map(RequireIdentity)
            .ok_or_else(|| ApiError::unauthorized("Sign in or provide a guest id"))
    }
}

/// Signed-in account, required.
#[derive(Debug, Clone)]
pub struct RequireAccount {
    /// Account ID.
    pub user_id: i64,
    /// Account username.
    pub username: String,
}

#[async_trait]
impl<S> FromRequestParts<S> for RequireAccount
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match resolve(parts)? {
            Some(Identity::Account { user_id, username }) => {
                Ok(RequireAccount { user_id, username })
            }
            _ => Err(ApiError::unauthorized("Missing authorization")),
        }
    }
}

/// Middleware function to inject the identity resolver into request extensions.
pub async fn identity_layer(
    resolver: Arc<IdentityResolver>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    request.extensions_mut().insert(resolver);
    next.run(request).await
}
