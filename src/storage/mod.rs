//! Blob storage for uploaded artifacts.
//!
//! Artifact records only hold an opaque storage key; the bytes live in a
//! [`BlobStore`]. The store also mints short-lived retrieval handles that
//! let a recipient fetch a blob without going through the access checks
//! again.

mod local;
mod signer;

pub use local::LocalBlobStore;
pub use signer::{BlobClaims, HandleSigner};

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::Result;

/// Storage backend for artifact bytes.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store content and return its newly generated storage key.
    async fn put(&self, content: &[u8], original_name: &str) -> Result<String>;

    /// Load the content stored under `key`.
    async fn get(&self, key: &str) -> Result<Vec<u8>>;

    /// Delete a blob. Returns `false` if nothing was stored under `key`.
    async fn delete(&self, key: &str) -> Result<bool>;

    /// Produce a retrieval URL for `key` that stops working at `expires_at`.
    ///
    /// `download_name` is the filename the recipient's browser should save.
    async fn presign(
        &self,
        key: &str,
        download_name: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<String>;
}

/// Shared blob store handle.
pub type SharedBlobStore = Arc<dyn BlobStore>;
