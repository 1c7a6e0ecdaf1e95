//! Request DTOs for Web API.

use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use super::validation::{no_control_chars, not_empty_trimmed, valid_username};

/// Login request.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    /// Username.
    #[validate(custom(function = "not_empty_trimmed"))]
    pub username: String,
    /// Password.
    #[validate(length(min = 1, max = 128, message = "Password is required"))]
    pub password: String,
}

/// Logout request.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct LogoutRequest {
    /// Refresh token to invalidate.
    #[serde(default)]
    #[validate(length(max = 256, message = "Refresh token is too long"))]
    pub refresh_token: Option<String>,
}

/// Token refresh request.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RefreshRequest {
    /// Refresh token.
    #[validate(custom(function = "not_empty_trimmed"))]
    pub refresh_token: String,
}

/// Account registration request.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    /// Username.
    #[validate(custom(function = "valid_username"))]
    pub username: String,
    /// Password.
    #[validate(
        length(min = 8, max = 128, message = "Password must be 8-128 characters"),
        custom(function = "no_control_chars")
    )]
    pub password: String,
}

/// Download request. Every field is optional; an absent body is the same
/// as `{}`.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DownloadRequest {
    /// Artifact password, when the artifact has one.
    #[serde(default)]
    #[validate(length(max = 128, message = "Password must be at most 128 characters"))]
    pub password: Option<String>,
}
