//! Account handlers: register, login, refresh, logout, whoami.

use axum::{extract::State, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Duration;
use std::sync::Arc;

use crate::datetime::to_rfc3339;
use crate::db::{NewRefreshToken, NewUser, RefreshTokenRepository, User, UserRepository};
use crate::identity::{Identity, SESSION_COOKIE};
use crate::web::dto::{
    LoginRequest, LoginResponse, LogoutRequest, MeResponse, OptionalValidatedJson,
    RefreshRequest, RefreshResponse, RegisterRequest, SuccessResponse, UserInfo, ValidatedJson,
};
use crate::web::error::{ApiError, ErrorBody};
use crate::web::handlers::AppState;
use crate::web::middleware::CurrentIdentity;

fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

impl AppState {
    /// Issue an access token and a stored refresh token for `user`.
    async fn start_session(&self, user: &User) -> Result<(String, String, i64), ApiError> {
        let issued = self.resolver.keys().issue(user.id, &user.username)?;
        let refresh_token = self.generate_refresh_token();

        RefreshTokenRepository::new(self.db.pool())
            .create(&NewRefreshToken {
                user_id: user.id,
                token: refresh_token.clone(),
                expires_at: self.now() + Duration::days(self.refresh_token_expiry_days),
            })
            .await
            .map_err(|e| {
                tracing::error!("Failed to store refresh token: {}", e);
                ApiError::internal("Failed to create session")
            })?;

        Ok((issued.token, refresh_token, issued.expires_in))
    }
}

/// POST /api/auth/register - Create an account and sign in.
#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Account created", body = LoginResponse),
        (status = 409, description = "Username taken", body = ErrorBody),
        (status = 422, description = "Invalid username or password", body = ErrorBody)
    )
)]
pub async fn register(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> Result<(CookieJar, Json<LoginResponse>), ApiError> {
    let users = UserRepository::new(state.db.pool());
    if users.username_exists(&req.username).await? {
        return Err(ApiError::conflict("Username already exists"));
    }

    let password_hash = crate::hash_password(&req.password)
        .map_err(|e| ApiError::unprocessable(format!("Password error: {}", e)))?;

    let user = users
        .create(&NewUser::new(&req.username, password_hash))
        .await?;

    tracing::info!(user_id = user.id, username = %user.username, "account registered");

    let (access_token, refresh_token, expires_in) = state.start_session(&user).await?;
    let jar = jar.add(session_cookie(access_token.clone()));

    Ok((
        jar,
        Json(LoginResponse {
            access_token,
            refresh_token,
            expires_in,
            user: UserInfo {
                id: user.id,
                username: user.username,
            },
        }),
    ))
}

/// POST /api/auth/login - Sign in with username and password.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = ErrorBody)
    )
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>), ApiError> {
    let repo = UserRepository::new(state.db.pool());
    let user = repo
        .get_by_username(req.username.trim())
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid username or password"))?;

    if crate::verify_password(&req.password, &user.password).is_err() {
        tracing::info!(username = %user.username, "failed login");
        return Err(ApiError::unauthorized("Invalid username or password"));
    }

    let (access_token, refresh_token, expires_in) = state.start_session(&user).await?;

    if let Err(e) = repo.update_last_login(user.id, &state.now()).await {
        tracing::warn!(user_id = user.id, error = %e, "failed to update last login");
    }

    let jar = jar.add(session_cookie(access_token.clone()));

    Ok((
        jar,
        Json(LoginResponse {
            access_token,
            refresh_token,
            expires_in,
            user: UserInfo {
                id: user.id,
                username: user.username,
            },
        }),
    ))
}

/// POST /api/auth/refresh - Exchange a refresh token for new tokens.
///
/// The presented refresh token is revoked; each one works once.
#[utoipa::path(
    post,
    path = "/api/auth/refresh",
    tag = "auth",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "New tokens", body = RefreshResponse),
        (status = 401, description = "Invalid or expired refresh token", body = ErrorBody)
    )
)]
pub async fn refresh(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    ValidatedJson(req): ValidatedJson<RefreshRequest>,
) -> Result<(CookieJar, Json<RefreshResponse>), ApiError> {
    let now = state.now();
    let tokens = RefreshTokenRepository::new(state.db.pool());

    let stored = tokens
        .get_valid_token(&req.refresh_token, &now)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid or expired refresh token"))?;

    if !tokens.revoke(&stored.token, &now).await? {
        // Lost a race with a concurrent refresh of the same token
        return Err(ApiError::unauthorized("Invalid or expired refresh token"));
    }

    let user = UserRepository::new(state.db.pool())
        .get_by_id(stored.user_id)
        .await?
        .ok_or_else(|| ApiError::unauthorized("User not found"))?;

    let (access_token, refresh_token, expires_in) = state.start_session(&user).await?;
    let jar = jar.add(session_cookie(access_token.clone()));

    Ok((
        jar,
        Json(RefreshResponse {
            access_token,
            refresh_token,
            expires_in,
        }),
    ))
}

/// POST /api/auth/logout - Sign out.
///
/// Revokes the refresh token, if one is given, and clears the session cookie.
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "auth",
    request_body(content = LogoutRequest, description = "Refresh token to revoke"),
    responses((status = 200, description = "Signed out", body = SuccessResponse))
)]
pub async fn logout(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    OptionalValidatedJson(req): OptionalValidatedJson<LogoutRequest>,
) -> Result<(CookieJar, Json<SuccessResponse>), ApiError> {

    if let Some(token) = req.refresh_token.filter(|t| !t.is_empty()) {
        RefreshTokenRepository::new(state.db.pool())
            .revoke(&token, &state.now())
            .await?;
    }

    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    Ok((jar, Json(SuccessResponse::ok())))
}

/// GET /api/auth/me - Who the caller is.
#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "auth",
    responses(
        (status = 200, description = "Current identity", body = MeResponse),
        (status = 401, description = "No identity", body = ErrorBody)
    ),
    security(("bearer_auth" = []), ("guest_id" = []))
)]
pub async fn me(
    State(state): State<Arc<AppState>>,
    CurrentIdentity(identity): CurrentIdentity,
) -> Result<Json<MeResponse>, ApiError> {
    match identity {
        Some(Identity::Account { user_id, .. }) => {
            let user = UserRepository::new(state.db.pool())
                .get_by_id(user_id)
                .await?
                .ok_or_else(|| ApiError::unauthorized("User not found"))?;

            Ok(Json(MeResponse {
                kind: "account".to_string(),
                id: Some(user.id),
                username: Some(user.username),
                guest_id: None,
                created_at: Some(to_rfc3339(&user.created_at)),
                last_login_at: user.last_login.as_deref().map(to_rfc3339),
            }))
        }
        Some(Identity::Guest { guest_id }) => Ok(Json(MeResponse {
            kind: "guest".to_string(),
            id: None,
            username: None,
            guest_id: Some(guest_id),
            created_at: None,
            last_login_at: None,
        })),
        None => Err(ApiError::unauthorized("Missing authorization")),
    }
}
