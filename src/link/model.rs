//! Short link model.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;

use crate::datetime::parse_db;
use crate::{FiledropError, Result};

/// URL-safe alphabet used for short ids.
pub const SHORT_ID_ALPHABET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789_-";

/// A short id mapped to a long-form URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortLink {
    /// Random token.
    pub short_id: String,
    /// URL the token redirects to.
    pub target_url: String,
    /// Creation time; the link stops resolving after the retention window.
    pub created_at: DateTime<Utc>,
}

impl ShortLink {
    /// Whether the link is past its retention window at `now`.
    pub fn is_expired(&self, retention: Duration, now: DateTime<Utc>) -> bool {
        now > self.created_at + retention
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct ShortLinkRow {
    pub short_id: String,
    pub target_url: String,
    pub created_at: String,
}

impl TryFrom<ShortLinkRow> for ShortLink {
    type Error = FiledropError;

    fn try_from(row: ShortLinkRow) -> Result<Self> {
        let created_at = parse_db(&row.created_at).ok_or_else(|| {
            FiledropError::Database(format!("invalid timestamp in created_at: {}", row.created_at))
        })?;
        Ok(Self {
            short_id: row.short_id,
            target_url: row.target_url,
            created_at,
        })
    }
}

/// Generate a random short id of `length` characters.
pub fn generate_short_id(length: usize) -> String {
    let mut rng = rand::rng();
    (0..length)
        .map(|_| SHORT_ID_ALPHABET[rng.random_range(0..SHORT_ID_ALPHABET.len())] as char)
        .collect()
}

/// Whether `candidate` could have been produced by [`generate_short_id`].
pub fn is_valid_short_id(candidate: &str) -> bool {
    !candidate.is_empty()
        && candidate.len() <= 64
        && candidate.bytes().all(|b| SHORT_ID_ALPHABET.contains(&b))
}
