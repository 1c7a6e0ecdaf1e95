//! Download grant issuer.
//!
//! A grant counts one download against the artifact's quota and then hands
//! out a short-lived retrieval handle from the blob store. The download is
//! counted first: a client that never uses its handle still spends a unit
//! of quota.

use chrono::{DateTime, Duration, Utc};

use crate::artifact::{ArtifactRecord, ArtifactStore};
use crate::storage::SharedBlobStore;
use crate::{FiledropError, Result};

/// Time-limited reference to an artifact's bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievalHandle {
    /// URL the recipient fetches the bytes from.
    pub url: String,
    /// Filename to save the bytes as.
    pub name: String,
    /// When the URL stops working.
    pub expires_at: DateTime<Utc>,
}

/// Issues download grants for artifacts that passed the access gate.
#[derive(Clone)]
pub struct DownloadGrantIssuer {
    artifacts: ArtifactStore,
    blobs: SharedBlobStore,
    ttl: Duration,
}

impl DownloadGrantIssuer {
    /// Create an issuer whose handles live for `ttl`.
    pub fn new(artifacts: ArtifactStore, blobs: SharedBlobStore, ttl: Duration) -> Self {
        Self {
            artifacts,
            blobs,
            ttl,
        }
    }

    /// Lifetime of issued handles.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Count a download for `record` and return a retrieval handle.
    ///
    /// Call only after the access gate permitted the download. The work runs
    /// on its own task so that a caller going away after the count is
    /// committed does not prevent the handle from being issued.
    ///
    /// Fails with `Expired` when another request used up the quota (or the
    /// time limit passed) between the gate check and the increment.
    pub async fn issue_grant(&self, record: &ArtifactRecord) -> Result<RetrievalHandle> {
        let issuer = self.clone();
        let record = record.clone();

        tokio::spawn(async move { issuer.count_and_sign(&record).await })
            .await
            .map_err(|e| FiledropError::Storage(format!("grant task failed: {e}")))?
    }

    async fn count_and_sign(&self, record: &ArtifactRecord) -> Result<RetrievalHandle> {
        self.artifacts
            .record_successful_download(&record.id)
            .await?;

        let expires_at = self.artifacts.now() + self.ttl;
        let url = self
            .blobs
            .presign(&record.storage_key, &record.original_name, expires_at)
            .await?;

        tracing::info!(
            artifact_id = %record.id,
            expires_at = %expires_at,
            "download grant issued"
        );

        Ok(RetrievalHandle {
            url,
            name: record.original_name.clone(),
            expires_at,
        })
    }
}
