//! Response DTOs for Web API.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::artifact::ArtifactRecord;
use crate::datetime::format_rfc3339;
use crate::grant::RetrievalHandle;
use crate::share::{ArtifactMetadata, UploadOutcome};

// ============================================================================
// Share DTOs
// ============================================================================

/// Upload response.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    /// Always true on a 200 response.
    pub success: bool,
    /// Short link to share with recipients.
    pub link: String,
    /// Artifact ID.
    pub file_id: String,
    /// Short link ID.
    pub short_id: String,
}

impl UploadResponse {
    /// Build from the outcome of an upload.
    pub fn new(outcome: &UploadOutcome) -> Self {
        Self {
            success: true,
            link: outcome.link.clone(),
            file_id: outcome.record.id.clone(),
            short_id: outcome.short_link.short_id.clone(),
        }
    }
}

/// Public metadata of an artifact.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FileMetaResponse {
    /// Artifact ID.
    pub id: String,
    /// Original file name.
    pub name: String,
    /// Size in bytes.
    pub size: i64,
    /// Whether a password is required to download.
    pub has_password: bool,
}

impl From<ArtifactMetadata> for FileMetaResponse {
    fn from(meta: ArtifactMetadata) -> Self {
        Self {
            id: meta.id,
            name: meta.name,
            size: meta.size,
            has_password: meta.has_password,
        }
    }
}

/// Download grant.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DownloadResponse {
    /// Short-lived retrieval URL.
    pub url: String,
    /// File name to save as.
    pub name: String,
    /// When the URL stops working (RFC 3339).
    pub expires_at: String,
}

impl From<RetrievalHandle> for DownloadResponse {
    fn from(handle: RetrievalHandle) -> Self {
        Self {
            url: handle.url,
            name: handle.name,
            expires_at: format_rfc3339(&handle.expires_at),
        }
    }
}

/// One entry of the owner's upload listing.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FileEntryResponse {
    /// Artifact ID.
    pub id: String,
    /// Original file name.
    pub name: String,
    /// Size in bytes.
    pub size: i64,
    /// Whether a password is set.
    pub has_password: bool,
    /// Completed downloads.
    pub download_count: i64,
    /// Download quota, if any.
    pub download_limit: Option<i64>,
    /// Expiry time (RFC 3339), if any.
    pub expires_at: Option<String>,
    /// Upload time (RFC 3339).
    pub created_at: String,
    /// Whether the artifact is past its time limit or quota.
    pub expired: bool,
    /// Metadata page recipients land on.
    pub page_url: String,
}

impl FileEntryResponse {
    /// Build a listing entry as seen at `now`.
    pub fn new(record: &ArtifactRecord, page_url: String, now: DateTime<Utc>) -> Self {
        Self {
            id: record.id.clone(),
            name: record.original_name.clone(),
            size: record.size,
            has_password: record.has_password(),
            download_count: record.download_count,
            download_limit: record.download_limit,
            expires_at: record.expires_at.as_ref().map(format_rfc3339),
            created_at: format_rfc3339(&record.created_at),
            expired: record.is_expired(now),
            page_url,
        }
    }
}

/// Plain acknowledgement.
#[derive(Debug, Serialize, ToSchema)]
pub struct SuccessResponse {
    /// Always true on a 2xx response.
    pub success: bool,
}

impl SuccessResponse {
    /// Successful acknowledgement.
    pub fn ok() -> Self {
        Self { success: true }
    }
}

// ============================================================================
// Auth DTOs
// ============================================================================

/// Login response.
#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    /// Access token (JWT).
    pub access_token: String,
    /// Refresh token.
    pub refresh_token: String,
    /// Access token expiry in seconds.
    pub expires_in: i64,
    /// User information.
    pub user: UserInfo,
}

/// User information in responses.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserInfo {
    /// User ID.
    pub id: i64,
    /// Username.
    pub username: String,
}

/// Token refresh response.
#[derive(Debug, Serialize, ToSchema)]
pub struct RefreshResponse {
    /// New access token.
    pub access_token: String,
    /// New refresh token.
    pub refresh_token: String,
    /// Expiry in seconds.
    pub expires_in: i64,
}

/// Current identity (for /api/auth/me).
#[derive(Debug, Serialize, ToSchema)]
pub struct MeResponse {
    /// "account" or "guest".
    pub kind: String,
    /// User ID (accounts only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Username (accounts only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Guest identifier (guests only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guest_id: Option<String>,
    /// Account creation timestamp.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Last login timestamp.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_login_at: Option<String>,
}
