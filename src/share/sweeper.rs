//! Background retention sweep.

use std::time::Duration;

use tokio::task::JoinHandle;

use super::service::ShareService;
use crate::db::{Database, RefreshTokenRepository};

/// Counts of what one sweep removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Short links past their retention window.
    pub short_links: u64,
    /// Artifacts (record and blob) dead for longer than the grace period.
    pub artifacts: u64,
    /// Expired or revoked refresh tokens.
    pub refresh_tokens: u64,
}

/// Periodically removes expired links, dead artifacts and stale sessions.
pub struct Sweeper {
    share: ShareService,
    db: Database,
    interval: Duration,
}

impl Sweeper {
    /// Create a sweeper running every `interval`.
    pub fn new(share: ShareService, db: Database, interval: Duration) -> Self {
        Self {
            share,
            db,
            interval,
        }
    }

    /// Run one sweep. A failing step is logged and the remaining steps still run.
    pub async fn run_once(&self) -> SweepReport {
        let mut report = SweepReport::default();

        match self.share.links().sweep().await {
            Ok(count) => report.short_links = count,
            Err(e) => tracing::warn!(error = %e, "Failed to sweep short links"),
        }

        match self.share.purge_dead_artifacts().await {
            Ok(count) => report.artifacts = count,
            Err(e) => tracing::warn!(error = %e, "Failed to purge dead artifacts"),
        }

        let now = self.share.artifacts().now();
        match RefreshTokenRepository::new(self.db.pool())
            .cleanup_expired(&now)
            .await
        {
            Ok(count) => report.refresh_tokens = count,
            Err(e) => tracing::warn!(error = %e, "Failed to cleanup refresh tokens"),
        }

        if report == SweepReport::default() {
            tracing::debug!("Retention sweep found nothing to remove");
        } else {
            tracing::info!(
                short_links = report.short_links,
                artifacts = report.artifacts,
                refresh_tokens = report.refresh_tokens,
                "Retention sweep completed"
            );
        }

        report
    }

    /// Spawn the sweep loop. The first sweep runs one interval after start.
    pub fn start(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.interval);

            // Skip the first immediate tick
            interval.tick().await;

            loop {
                interval.tick().await;
                self.run_once().await;
            }
        })
    }
}
