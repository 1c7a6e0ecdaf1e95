//! Link registry: mints and resolves short links.

use std::sync::Arc;

use chrono::Duration;

use super::model::{generate_short_id, is_valid_short_id, ShortLink};
use super::repository::ShortLinkRepository;
use crate::clock::SharedClock;
use crate::config::LinksConfig;
use crate::db::Database;
use crate::{FiledropError, Result};

/// Produces candidate short ids of the requested length.
pub type ShortIdGenerator = Arc<dyn Fn(usize) -> String + Send + Sync>;

/// Creates and resolves short links.
///
/// Links stay resolvable for `retention_days` after creation, independent
/// of the expiry policy of whatever they point at.
#[derive(Clone)]
pub struct LinkRegistry {
    db: Database,
    clock: SharedClock,
    config: LinksConfig,
    generator: ShortIdGenerator,
}

impl LinkRegistry {
    /// Create a registry using random short ids.
    pub fn new(db: Database, clock: SharedClock, config: LinksConfig) -> Self {
        Self {
            db,
            clock,
            config,
            generator: Arc::new(generate_short_id),
        }
    }

    /// Replace the short id generator.
    pub fn with_generator(mut self, generator: ShortIdGenerator) -> Self {
        self.generator = generator;
        self
    }

    fn repo(&self) -> ShortLinkRepository<'_> {
        ShortLinkRepository::new(self.db.pool())
    }

    /// How long a link stays resolvable.
    pub fn retention(&self) -> Duration {
        Duration::days(self.config.retention_days as i64)
    }

    /// Mint a short link for `target_url`.
    ///
    /// A collision with an existing id is retried with a fresh id, at most
    /// `max_collision_retries` times after the first attempt.
    pub async fn create_short_link(&self, target_url: &str) -> Result<ShortLink> {
        let retries = self.config.max_collision_retries;

        for attempt in 0..=retries {
            let link = ShortLink {
                short_id: (self.generator)(self.config.short_id_length),
                target_url: target_url.to_string(),
                created_at: self.clock.now(),
            };

            if self.repo().insert(&link).await? {
                tracing::debug!(short_id = %link.short_id, "short link created");
                return Ok(link);
            }

            tracing::warn!(
                short_id = %link.short_id,
                attempt,
                "short id collision"
            );
        }

        Err(FiledropError::Database(format!(
            "no free short id after {retries} retries"
        )))
    }

    /// Resolve a short id to its target URL.
    ///
    /// Unknown ids and links past the retention window are `NotFound`.
    /// The artifact behind the URL is not consulted.
    pub async fn resolve_short_link(&self, short_id: &str) -> Result<String> {
        if !is_valid_short_id(short_id) {
            return Err(FiledropError::NotFound("short link".to_string()));
        }

        match self.repo().get(short_id).await? {
            Some(link) if !link.is_expired(self.retention(), self.clock.now()) => {
                Ok(link.target_url)
            }
            _ => Err(FiledropError::NotFound("short link".to_string())),
        }
    }

    /// Remove a link.
    pub async fn delete_short_link(&self, short_id: &str) -> Result<bool> {
        self.repo().delete(short_id).await
    }

    /// Remove every link past the retention window. Returns the number removed.
    pub async fn sweep(&self) -> Result<u64> {
        let cutoff = self.clock.now() - self.retention();
        self.repo().delete_created_before(&cutoff).await
    }
}
