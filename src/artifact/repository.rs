//! Artifact repository for database operations.

use chrono::{DateTime, Utc};

use super::record::{ArtifactRecord, ArtifactRow};
use crate::datetime::to_db;
use crate::db::DbPool;
use crate::{FiledropError, Result};

const SELECT_COLUMNS: &str = "SELECT id, storage_key, original_name, size, password_hash, \
     expires_at, download_limit, download_count, owner_id, created_at, last_download_at \
     FROM artifacts";

/// Repository for artifact records.
pub struct ArtifactRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> ArtifactRepository<'a> {
    /// Create a new ArtifactRepository with the given database pool reference.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Persist a fully populated record.
    pub async fn insert(&self, record: &ArtifactRecord) -> Result<()> {
        sqlx::query(
            "INSERT INTO artifacts (id, storage_key, original_name, size, password_hash,
                                    expires_at, download_limit, download_count, owner_id,
                                    created_at, last_download_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&record.id)
        .bind(&record.storage_key)
        .bind(&record.original_name)
        .bind(record.size)
        .bind(&record.password_hash)
        .bind(record.expires_at.as_ref().map(to_db))
        .bind(record.download_limit)
        .bind(record.download_count)
        .bind(&record.owner_id)
        .bind(to_db(&record.created_at))
        .bind(record.last_download_at.as_ref().map(to_db))
        .execute(self.pool)
        .await
        .map_err(|e| FiledropError::Database(e.to_string()))?;

        Ok(())
    }

    /// Get a record by ID.
    pub async fn get_by_id(&self, id: &str) -> Result<Option<ArtifactRecord>> {
        let row = sqlx::query_as::<_, ArtifactRow>(&format!("{SELECT_COLUMNS} WHERE id = ?"))
            .bind(id)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| FiledropError::Database(e.to_string()))?;

        row.map(ArtifactRecord::try_from).transpose()
    }

    /// Count one download if the record is still live at `now`.
    ///
    /// The quota and expiry checks and the increment happen in a single
    /// conditional UPDATE, so concurrent callers can never push the count
    /// past the limit. Returns `false` when the record is missing or dead.
    pub async fn try_record_download(&self, id: &str, now: &DateTime<Utc>) -> Result<bool> {
        let now = to_db(now);
        let result = sqlx::query(
            "UPDATE artifacts
             SET download_count = download_count + 1, last_download_at = ?
             WHERE id = ?
               AND (download_limit IS NULL OR download_count < download_limit)
               AND (expires_at IS NULL OR expires_at >= ?)",
        )
        .bind(&now)
        .bind(id)
        .bind(&now)
        .execute(self.pool)
        .await
        .map_err(|e| FiledropError::Database(e.to_string()))?;

        Ok(result.rows_affected() == 1)
    }

    /// List the records of an owner, newest first.
    pub async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<ArtifactRecord>> {
        let rows = sqlx::query_as::<_, ArtifactRow>(&format!(
            "{SELECT_COLUMNS} WHERE owner_id = ? ORDER BY created_at DESC, rowid DESC"
        ))
        .bind(owner_id)
        .fetch_all(self.pool)
        .await
        .map_err(|e| FiledropError::Database(e.to_string()))?;

        rows.into_iter().map(ArtifactRecord::try_from).collect()
    }

    /// Delete a record. Returns `false` if it did not exist.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM artifacts WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| FiledropError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    /// Records that have been dead since before `cutoff`.
    ///
    /// A time-limited record qualifies once its expiry is older than the
    /// cutoff. A record out of quota qualifies once its last download (or its
    /// creation, for a zero limit) is older than the cutoff.
    pub async fn list_purgeable(&self, cutoff: &DateTime<Utc>) -> Result<Vec<ArtifactRecord>> {
        let cutoff = to_db(cutoff);
        let rows = sqlx::query_as::<_, ArtifactRow>(&format!(
            "{SELECT_COLUMNS}
             WHERE (expires_at IS NOT NULL AND expires_at < ?)
                OR (download_limit IS NOT NULL
                    AND download_count >= download_limit
                    AND COALESCE(last_download_at, created_at) < ?)"
        ))
        .bind(&cutoff)
        .bind(&cutoff)
        .fetch_all(self.pool)
        .await
        .map_err(|e| FiledropError::Database(e.to_string()))?;

        rows.into_iter().map(ArtifactRecord::try_from).collect()
    }

    /// Count all records.
    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM artifacts")
            .fetch_one(self.pool)
            .await
            .map_err(|e| FiledropError::Database(e.to_string()))?;
        Ok(count)
    }
}
