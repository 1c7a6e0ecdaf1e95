//! Short link repository for database operations.

use chrono::{DateTime, Utc};

use super::model::{ShortLink, ShortLinkRow};
use crate::datetime::to_db;
use crate::db::{is_unique_violation, DbPool};
use crate::{FiledropError, Result};

/// Repository for short links.
pub struct ShortLinkRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> ShortLinkRepository<'a> {
    /// Create a new ShortLinkRepository with the given database pool reference.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Insert a link.
    ///
    /// Returns `Ok(false)` if the short id is already taken; the existing
    /// mapping is left untouched.
    pub async fn insert(&self, link: &ShortLink) -> Result<bool> {
        let result = sqlx::query(
            "INSERT INTO short_links (short_id, target_url, created_at) VALUES (?, ?, ?)",
        )
        .bind(&link.short_id)
        .bind(&link.target_url)
        .bind(to_db(&link.created_at))
        .execute(self.pool)
        .await;

        match result {
            Ok(_) => Ok(true),
            Err(e) if is_unique_violation(&e) => Ok(false),
            Err(e) => Err(FiledropError::Database(e.to_string())),
        }
    }

    /// Get a link by short id.
    pub async fn get(&self, short_id: &str) -> Result<Option<ShortLink>> {
        let row = sqlx::query_as::<_, ShortLinkRow>(
            "SELECT short_id, target_url, created_at FROM short_links WHERE short_id = ?",
        )
        .bind(short_id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| FiledropError::Database(e.to_string()))?;

        row.map(ShortLink::try_from).transpose()
    }

    /// Delete a link. Returns `false` if it did not exist.
    pub async fn delete(&self, short_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM short_links WHERE short_id = ?")
            .bind(short_id)
            .execute(self.pool)
            .await
            .map_err(|e| FiledropError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete links created before `cutoff`.
    pub async fn delete_created_before(&self, cutoff: &DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query("DELETE FROM short_links WHERE created_at < ?")
            .bind(to_db(cutoff))
            .execute(self.pool)
            .await
            .map_err(|e| FiledropError::Database(e.to_string()))?;

        Ok(result.rows_affected())
    }
}
