//! Refresh token repository for account sessions.

use chrono::{DateTime, Utc};

use super::DbPool;
use crate::datetime::to_db;
use crate::{FiledropError, Result};

/// Refresh token entity.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RefreshToken {
    /// Token ID.
    pub id: i64,
    /// User ID.
    pub user_id: i64,
    /// Token string.
    pub token: String,
    /// Expiration timestamp.
    pub expires_at: String,
    /// Creation timestamp.
    pub created_at: String,
    /// Revocation timestamp (None if not revoked).
    pub revoked_at: Option<String>,
}

/// New refresh token for creation.
pub struct NewRefreshToken {
    /// User ID.
    pub user_id: i64,
    /// Token string.
    pub token: String,
    /// Expiration time.
    pub expires_at: DateTime<Utc>,
}

/// Repository for refresh token operations.
///
/// Methods that compare against the current time take it as a parameter
/// so that callers decide which clock is authoritative.
pub struct RefreshTokenRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> RefreshTokenRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Create a new refresh token.
    pub async fn create(&self, new_token: &NewRefreshToken) -> Result<RefreshToken> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO refresh_tokens (user_id, token, expires_at) VALUES (?, ?, ?) RETURNING id",
        )
        .bind(new_token.user_id)
        .bind(&new_token.token)
        .bind(to_db(&new_token.expires_at))
        .fetch_one(self.pool)
        .await
        .map_err(|e| FiledropError::Database(e.to_string()))?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| FiledropError::NotFound("refresh token".into()))
    }

    /// Get a refresh token by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<RefreshToken>> {
        let token = sqlx::query_as::<_, RefreshToken>(
            "SELECT id, user_id, token, expires_at, created_at, revoked_at
             FROM refresh_tokens WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| FiledropError::Database(e.to_string()))?;

        Ok(token)
    }

    /// Get a refresh token that is neither expired nor revoked at `now`.
    pub async fn get_valid_token(
        &self,
        token: &str,
        now: &DateTime<Utc>,
    ) -> Result<Option<RefreshToken>> {
        let result = sqlx::query_as::<_, RefreshToken>(
            "SELECT id, user_id, token, expires_at, created_at, revoked_at
             FROM refresh_tokens
             WHERE token = ?
               AND revoked_at IS NULL
               AND expires_at > ?",
        )
        .bind(token)
        .bind(to_db(now))
        .fetch_optional(self.pool)
        .await
        .map_err(|e| FiledropError::Database(e.to_string()))?;

        Ok(result)
    }

    /// Revoke a refresh token. Returns false if it was unknown or already revoked.
    pub async fn revoke(&self, token: &str, now: &DateTime<Utc>) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE refresh_tokens SET revoked_at = ? WHERE token = ? AND revoked_at IS NULL",
        )
        .bind(to_db(now))
        .bind(token)
        .execute(self.pool)
        .await
        .map_err(|e| FiledropError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    /// Revoke all tokens for a user.
    pub async fn revoke_all_for_user(&self, user_id: i64, now: &DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE refresh_tokens SET revoked_at = ? WHERE user_id = ? AND revoked_at IS NULL",
        )
        .bind(to_db(now))
        .bind(user_id)
        .execute(self.pool)
        .await
        .map_err(|e| FiledropError::Database(e.to_string()))?;

        Ok(result.rows_affected())
    }

    /// Delete expired and revoked tokens.
    pub async fn cleanup_expired(&self, now: &DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query(
            "DELETE FROM refresh_tokens WHERE expires_at < ? OR revoked_at IS NOT NULL",
        )
        .bind(to_db(now))
        .execute(self.pool)
        .await
        .map_err(|e| FiledropError::Database(e.to_string()))?;

        Ok(result.rows_affected())
    }
}
