//! Artifact record store.

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use super::record::{ArtifactRecord, NewArtifact};
use super::repository::ArtifactRepository;
use crate::auth::hash_secret;
use crate::clock::SharedClock;
use crate::db::Database;
use crate::{FiledropError, Result};

/// Longest accepted lifetime for an artifact (one year).
pub const MAX_EXPIRY_HOURS: i64 = 24 * 365;

/// Creates, reads, counts and deletes artifact records.
///
/// The store never touches blobs; callers that delete a record are
/// responsible for removing its blob.
#[derive(Clone)]
pub struct ArtifactStore {
    db: Database,
    clock: SharedClock,
}

impl ArtifactStore {
    /// Create a store over the given database and clock.
    pub fn new(db: Database, clock: SharedClock) -> Self {
        Self { db, clock }
    }

    fn repo(&self) -> ArtifactRepository<'_> {
        ArtifactRepository::new(self.db.pool())
    }

    /// Create a record.
    ///
    /// The password (if any) is hashed and the expiry is computed from the
    /// clock. The plaintext password is never persisted.
    pub async fn create_record(&self, new: NewArtifact) -> Result<ArtifactRecord> {
        if let Some(hours) = new.expires_in_hours {
            if !(1..=MAX_EXPIRY_HOURS).contains(&hours) {
                return Err(FiledropError::Validation(format!(
                    "expiresInHours must be between 1 and {MAX_EXPIRY_HOURS}"
                )));
            }
        }
        if new.download_limit.is_some_and(|limit| limit < 0) {
            return Err(FiledropError::Validation(
                "downloadLimit must not be negative".to_string(),
            ));
        }

        let password_hash = match new.password.as_deref() {
            Some(password) => Some(
                hash_secret(password).map_err(|e| FiledropError::Validation(e.to_string()))?,
            ),
            None => None,
        };

        let now = self.clock.now();
        let record = ArtifactRecord {
            id: Uuid::new_v4().to_string(),
            storage_key: new.storage_key,
            original_name: new.original_name,
            size: new.size,
            password_hash,
            expires_at: new.expires_in_hours.map(|hours| now + Duration::hours(hours)),
            download_limit: new.download_limit,
            download_count: 0,
            owner_id: new.owner_id,
            created_at: now,
            last_download_at: None,
        };

        self.repo().insert(&record).await?;

        // Read back so timestamps carry the stored precision.
        self.get_record(&record.id).await
    }

    /// Look up a record.
    pub async fn find_record(&self, id: &str) -> Result<Option<ArtifactRecord>> {
        self.repo().get_by_id(id).await
    }

    /// Get a record, failing with `NotFound` if it does not exist.
    pub async fn get_record(&self, id: &str) -> Result<ArtifactRecord> {
        self.find_record(id)
            .await?
            .ok_or_else(|| FiledropError::NotFound("artifact".to_string()))
    }

    /// Count one successful download.
    ///
    /// Fails with `Expired` if the record ran out of quota or time since it
    /// was checked, and with `NotFound` if it was deleted meanwhile.
    pub async fn record_successful_download(&self, id: &str) -> Result<()> {
        let now = self.clock.now();
        if self.repo().try_record_download(id, &now).await? {
            return Ok(());
        }

        match self.find_record(id).await? {
            Some(_) => Err(FiledropError::Expired),
            None => Err(FiledropError::NotFound("artifact".to_string())),
        }
    }

    /// Records belonging to `owner_id`, newest first.
    pub async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<ArtifactRecord>> {
        self.repo().list_by_owner(owner_id).await
    }

    /// Delete a record. Returns `false` if it did not exist.
    pub async fn delete_record(&self, id: &str) -> Result<bool> {
        self.repo().delete(id).await
    }

    /// Records that have been dead since before `cutoff`.
    pub async fn list_purgeable(&self, cutoff: &DateTime<Utc>) -> Result<Vec<ArtifactRecord>> {
        self.repo().list_purgeable(cutoff).await
    }

    /// Current time according to the store's clock.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }
}
