//! Share service: the upload and retrieval flows.

use chrono::Duration;

use crate::access::{evaluate, AccessRequest};
use crate::artifact::{ArtifactRecord, ArtifactStore, NewArtifact, MAX_EXPIRY_HOURS};
use crate::auth::{validate_secret, MAX_PASSWORD_LENGTH};
use crate::clock::SharedClock;
use crate::config::Config;
use crate::db::Database;
use crate::grant::{DownloadGrantIssuer, RetrievalHandle};
use crate::identity::Identity;
use crate::link::{LinkRegistry, ShortLink};
use crate::storage::SharedBlobStore;
use crate::{FiledropError, Result};

/// Maximum filename length in characters.
pub const MAX_FILENAME_LENGTH: usize = 255;

/// Owner key recorded for uploads made without any identity.
pub const ANONYMOUS_OWNER: &str = "anonymous";

/// Settings for the share flows.
#[derive(Debug, Clone)]
pub struct ShareSettings {
    /// Base URL of this server (short links).
    pub public_url: String,
    /// Base URL of the frontend (metadata pages).
    pub frontend_url: String,
    /// Largest accepted upload in bytes.
    pub max_upload_size: u64,
    /// How long a dead artifact is kept before it is purged.
    pub artifact_grace: Duration,
}

impl ShareSettings {
    /// Settings taken from the configuration file.
    pub fn from_config(config: &Config) -> Self {
        Self {
            public_url: config.server.public_url.trim_end_matches('/').to_string(),
            frontend_url: config.server.frontend_url.trim_end_matches('/').to_string(),
            max_upload_size: config.storage.max_upload_size_bytes(),
            artifact_grace: Duration::hours(config.retention.artifact_grace_hours as i64),
        }
    }
}

/// An upload as received from a caller.
#[derive(Debug, Clone, Default)]
pub struct UploadRequest {
    /// Original filename.
    pub file_name: String,
    /// File content.
    pub content: Vec<u8>,
    /// Optional password; an empty string means no password.
    pub password: Option<String>,
    /// Lifetime in hours.
    pub expires_in_hours: Option<i64>,
    /// Maximum number of downloads.
    pub download_limit: Option<i64>,
}

impl UploadRequest {
    /// Create an upload without password or limits.
    pub fn new(file_name: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content,
            ..Default::default()
        }
    }

    /// Set the password.
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Set the lifetime in hours.
    pub fn with_expiry_hours(mut self, hours: i64) -> Self {
        self.expires_in_hours = Some(hours);
        self
    }

    /// Set the download limit.
    pub fn with_download_limit(mut self, limit: i64) -> Self {
        self.download_limit = Some(limit);
        self
    }
}

/// Result of a successful upload.
#[derive(Debug, Clone)]
pub struct UploadOutcome {
    /// The created record.
    pub record: ArtifactRecord,
    /// The minted short link.
    pub short_link: ShortLink,
    /// Shareable URL (`{public_url}/s/{short_id}`).
    pub link: String,
}

/// What a recipient may learn about an artifact before downloading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactMetadata {
    /// Artifact ID.
    pub id: String,
    /// Original filename.
    pub name: String,
    /// Size in bytes.
    pub size: i64,
    /// Whether a password is needed to download.
    pub has_password: bool,
}

/// Upload, describe, download, list and delete shared files.
#[derive(Clone)]
pub struct ShareService {
    artifacts: ArtifactStore,
    links: LinkRegistry,
    grants: DownloadGrantIssuer,
    blobs: SharedBlobStore,
    settings: ShareSettings,
}

impl ShareService {
    /// Wire the service from its collaborators and the configuration.
    pub fn new(db: Database, blobs: SharedBlobStore, clock: SharedClock, config: &Config) -> Self {
        let artifacts = ArtifactStore::new(db.clone(), clock.clone());
        let links = LinkRegistry::new(db, clock, config.links.clone());
        let grants = DownloadGrantIssuer::new(
            artifacts.clone(),
            blobs.clone(),
            Duration::seconds(config.storage.grant_ttl_secs as i64),
        );

        Self {
            artifacts,
            links,
            grants,
            blobs,
            settings: ShareSettings::from_config(config),
        }
    }

    /// The artifact record store.
    pub fn artifacts(&self) -> &ArtifactStore {
        &self.artifacts
    }

    /// The link registry.
    pub fn links(&self) -> &LinkRegistry {
        &self.links
    }

    /// The blob store.
    pub fn blobs(&self) -> &SharedBlobStore {
        &self.blobs
    }

    /// Service settings.
    pub fn settings(&self) -> &ShareSettings {
        &self.settings
    }

    /// Short link URL for a short id.
    pub fn short_url(&self, short_id: &str) -> String {
        format!("{}/s/{}", self.settings.public_url, short_id)
    }

    /// Long-form metadata page URL for an artifact.
    pub fn metadata_page_url(&self, artifact_id: &str) -> String {
        format!("{}/download/{}", self.settings.frontend_url, artifact_id)
    }

    fn validate_upload(&self, request: &UploadRequest) -> Result<Option<String>> {
        let name = request.file_name.trim();
        if name.is_empty() {
            return Err(FiledropError::Validation("file name is required".to_string()));
        }
        if name.chars().count() > MAX_FILENAME_LENGTH {
            return Err(FiledropError::Validation(format!(
                "file name must be at most {MAX_FILENAME_LENGTH} characters"
            )));
        }
        if name.chars().any(char::is_control) {
            return Err(FiledropError::Validation(
                "file name contains control characters".to_string(),
            ));
        }
        if request.content.is_empty() {
            return Err(FiledropError::Validation("file is empty".to_string()));
        }
        if request.content.len() as u64 > self.settings.max_upload_size {
            let max_mb = self.settings.max_upload_size / 1024 / 1024;
            return Err(FiledropError::Validation(format!(
                "file is too large (max {max_mb}MB)"
            )));
        }
        if let Some(hours) = request.expires_in_hours {
            if !(1..=MAX_EXPIRY_HOURS).contains(&hours) {
                return Err(FiledropError::Validation(format!(
                    "expiresInHours must be between 1 and {MAX_EXPIRY_HOURS}"
                )));
            }
        }
        if request.download_limit.is_some_and(|limit| limit < 1) {
            return Err(FiledropError::Validation(
                "downloadLimit must be at least 1".to_string(),
            ));
        }

        let password = request.password.clone().filter(|p| !p.is_empty());
        if let Some(ref password) = password {
            validate_secret(password).map_err(|_| {
                FiledropError::Validation(format!(
                    "password must be at most {MAX_PASSWORD_LENGTH} characters"
                ))
            })?;
        }
        Ok(password)
    }

    /// Store a file and mint its short link.
    ///
    /// The blob is stored first, then the record, then the short link. A
    /// failure in a later step removes what the earlier steps created, so
    /// a failed upload leaves nothing behind.
    pub async fn upload(
        &self,
        request: UploadRequest,
        owner: Option<&Identity>,
    ) -> Result<UploadOutcome> {
        let password = self.validate_upload(&request)?;
        let owner_id = owner
            .map(Identity::owner_key)
            .unwrap_or_else(|| ANONYMOUS_OWNER.to_string());
        let file_name = request.file_name.trim().to_string();

        let storage_key = self.blobs.put(&request.content, &file_name).await?;

        let mut new = NewArtifact::new(
            storage_key.clone(),
            file_name,
            request.content.len() as i64,
            owner_id,
        );
        new.password = password;
        new.expires_in_hours = request.expires_in_hours;
        new.download_limit = request.download_limit;

        let record = match self.artifacts.create_record(new).await {
            Ok(record) => record,
            Err(e) => {
                self.discard_blob(&storage_key).await;
                return Err(e);
            }
        };

        let target_url = self.metadata_page_url(&record.id);
        let short_link = match self.links.create_short_link(&target_url).await {
            Ok(link) => link,
            Err(e) => {
                tracing::warn!(
                    artifact_id = %record.id,
                    error = %e,
                    "short link creation failed, rolling back upload"
                );
                if let Err(del) = self.artifacts.delete_record(&record.id).await {
                    tracing::error!(artifact_id = %record.id, error = %del, "failed to remove orphaned record");
                }
                self.discard_blob(&storage_key).await;
                return Err(e);
            }
        };

        tracing::info!(
            artifact_id = %record.id,
            short_id = %short_link.short_id,
            size = record.size,
            has_password = record.has_password(),
            "file uploaded"
        );

        Ok(UploadOutcome {
            link: self.short_url(&short_link.short_id),
            record,
            short_link,
        })
    }

    async fn discard_blob(&self, storage_key: &str) {
        if let Err(e) = self.blobs.delete(storage_key).await {
            tracing::error!(key = %storage_key, error = %e, "failed to remove orphaned blob");
        }
    }

    /// Describe an artifact without requiring its password.
    pub async fn metadata(&self, id: &str) -> Result<ArtifactMetadata> {
        let record = self.artifacts.find_record(id).await?;
        evaluate(record.as_ref(), AccessRequest::Metadata, self.artifacts.now()).into_result()?;

        let record = record.ok_or_else(|| FiledropError::NotFound("artifact".to_string()))?;
        Ok(ArtifactMetadata {
            has_password: record.has_password(),
            id: record.id,
            name: record.original_name,
            size: record.size,
        })
    }

    /// Check access and issue a download grant.
    pub async fn download(&self, id: &str, password: Option<&str>) -> Result<RetrievalHandle> {
        let record = self.artifacts.find_record(id).await?;
        let password = password.filter(|p| !p.is_empty());
        evaluate(
            record.as_ref(),
            AccessRequest::Download { password },
            self.artifacts.now(),
        )
        .into_result()?;

        let record = record.ok_or_else(|| FiledropError::NotFound("artifact".to_string()))?;
        self.grants.issue_grant(&record).await
    }

    /// Resolve a short id to its metadata page URL.
    pub async fn resolve_short_link(&self, short_id: &str) -> Result<String> {
        self.links.resolve_short_link(short_id).await
    }

    /// Artifacts uploaded by `owner`, newest first.
    pub async fn list(&self, owner: &Identity) -> Result<Vec<ArtifactRecord>> {
        self.artifacts.list_by_owner(&owner.owner_key()).await
    }

    /// Delete an artifact owned by `owner`.
    ///
    /// Someone else's artifact is reported as `NotFound`.
    pub async fn delete(&self, id: &str, owner: &Identity) -> Result<()> {
        let owner_key = owner.owner_key();
        let record = self
            .artifacts
            .find_record(id)
            .await?
            .filter(|r| r.owner_id == owner_key)
            .ok_or_else(|| FiledropError::NotFound("artifact".to_string()))?;

        self.artifacts.delete_record(&record.id).await?;
        self.discard_blob(&record.storage_key).await;

        tracing::info!(artifact_id = %record.id, owner = %owner_key, "file deleted");
        Ok(())
    }

    /// Purge artifacts that have been dead for longer than the grace period.
    ///
    /// The blob is removed before the record; a record whose blob could not
    /// be removed is kept for the next run.
    pub async fn purge_dead_artifacts(&self) -> Result<u64> {
        let cutoff = self.artifacts.now() - self.settings.artifact_grace;
        let mut purged = 0;

        for record in self.artifacts.list_purgeable(&cutoff).await? {
            if let Err(e) = self.blobs.delete(&record.storage_key).await {
                tracing::warn!(artifact_id = %record.id, error = %e, "failed to purge blob");
                continue;
            }
            if self.artifacts.delete_record(&record.id).await? {
                purged += 1;
            }
        }

        Ok(purged)
    }
}
