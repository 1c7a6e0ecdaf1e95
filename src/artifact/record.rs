//! Artifact record model.

use chrono::{DateTime, Utc};

use crate::datetime::parse_db;
use crate::{FiledropError, Result};

/// Metadata of an uploaded artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactRecord {
    /// Server-generated identifier (UUID v4).
    pub id: String,
    /// Key of the blob in the blob store.
    pub storage_key: String,
    /// Filename supplied by the uploader.
    pub original_name: String,
    /// Size in bytes.
    pub size: i64,
    /// Argon2 hash of the artifact password, if one was set.
    pub password_hash: Option<String>,
    /// Absolute expiry; `None` means no time limit.
    pub expires_at: Option<DateTime<Utc>>,
    /// Maximum number of downloads; `None` means unlimited.
    pub download_limit: Option<i64>,
    /// Number of grants issued so far.
    pub download_count: i64,
    /// Owner key (`user:<id>` or `guest:<id>`).
    pub owner_id: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Time of the most recent grant.
    pub last_download_at: Option<DateTime<Utc>>,
}

impl ArtifactRecord {
    /// Whether a password is required to download.
    pub fn has_password(&self) -> bool {
        self.password_hash.is_some()
    }

    /// Whether the time limit has passed at `now`.
    pub fn is_time_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| now > expires_at)
    }

    /// Whether the download quota is used up.
    pub fn is_quota_exhausted(&self) -> bool {
        self.download_limit
            .is_some_and(|limit| self.download_count >= limit)
    }

    /// A record that is time-expired or out of quota is logically dead.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.is_time_expired(now) || self.is_quota_exhausted()
    }
}

/// Input for creating an artifact record.
#[derive(Debug, Clone, Default)]
pub struct NewArtifact {
    /// Key returned by the blob store.
    pub storage_key: String,
    /// Filename supplied by the uploader.
    pub original_name: String,
    /// Size in bytes.
    pub size: i64,
    /// Owner key.
    pub owner_id: String,
    /// Plaintext password; hashed before it is persisted.
    pub password: Option<String>,
    /// Lifetime in hours from creation.
    pub expires_in_hours: Option<i64>,
    /// Maximum number of downloads.
    pub download_limit: Option<i64>,
}

impl NewArtifact {
    /// Create a new artifact request without password or limits.
    pub fn new(
        storage_key: impl Into<String>,
        original_name: impl Into<String>,
        size: i64,
        owner_id: impl Into<String>,
    ) -> Self {
        Self {
            storage_key: storage_key.into(),
            original_name: original_name.into(),
            size,
            owner_id: owner_id.into(),
            ..Default::default()
        }
    }

    /// Protect the artifact with a password.
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Expire the artifact after the given number of hours.
    pub fn with_expiry_hours(mut self, hours: i64) -> Self {
        self.expires_in_hours = Some(hours);
        self
    }

    /// Limit the number of downloads.
    pub fn with_download_limit(mut self, limit: i64) -> Self {
        self.download_limit = Some(limit);
        self
    }
}

/// Database row for an artifact; timestamps are stored as text.
#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct ArtifactRow {
    pub id: String,
    pub storage_key: String,
    pub original_name: String,
    pub size: i64,
    pub password_hash: Option<String>,
    pub expires_at: Option<String>,
    pub download_limit: Option<i64>,
    pub download_count: i64,
    pub owner_id: String,
    pub created_at: String,
    pub last_download_at: Option<String>,
}

fn parse_timestamp(column: &str, value: &str) -> Result<DateTime<Utc>> {
    parse_db(value)
        .ok_or_else(|| FiledropError::Database(format!("invalid timestamp in {column}: {value}")))
}

impl TryFrom<ArtifactRow> for ArtifactRecord {
    type Error = FiledropError;

    fn try_from(row: ArtifactRow) -> Result<Self> {
        Ok(Self {
            expires_at: row
                .expires_at
                .as_deref()
                .map(|v| parse_timestamp("expires_at", v))
                .transpose()?,
            created_at: parse_timestamp("created_at", &row.created_at)?,
            last_download_at: row
                .last_download_at
                .as_deref()
                .map(|v| parse_timestamp("last_download_at", v))
                .transpose()?,
            id: row.id,
            storage_key: row.storage_key,
            original_name: row.original_name,
            size: row.size,
            password_hash: row.password_hash,
            download_limit: row.download_limit,
            download_count: row.download_count,
            owner_id: row.owner_id,
        })
    }
}
