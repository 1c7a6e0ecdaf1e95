//! Local filesystem blob store.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::fs;
use uuid::Uuid;

use super::signer::HandleSigner;
use super::BlobStore;
use crate::{FiledropError, Result};

/// Blob store keeping artifacts on local disk.
///
/// Blobs are stored in a sharded directory structure:
/// ```text
/// {base_path}/
/// ├── ab/
/// │   └── ab12cd34-5678-90ab-cdef-123456789012.pdf
/// ├── cd/
/// │   └── cd90ab12-3456-7890-abcd-ef1234567890.bin
/// └── ...
/// ```
///
/// Retrieval handles are signed URLs served by the `/blobs/{token}` route.
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    base_path: PathBuf,
    signer: HandleSigner,
}

impl LocalBlobStore {
    /// Create a store rooted at `base_path`, creating the directory if needed.
    pub fn new(base_path: impl Into<PathBuf>, signer: HandleSigner) -> Result<Self> {
        let base_path = base_path.into();
        std::fs::create_dir_all(&base_path)?;

        Ok(Self { base_path, signer })
    }

    /// Get the base path of this store.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Check if a blob exists.
    pub async fn exists(&self, key: &str) -> bool {
        match self.blob_path(key) {
            Some(path) => fs::try_exists(path).await.unwrap_or(false),
            None => false,
        }
    }

    /// Full path of a blob, or `None` if `key` is not a key this store could have issued.
    fn blob_path(&self, key: &str) -> Option<PathBuf> {
        let valid = key.len() > 2
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.')
            && !key.contains("..");
        if !valid {
            return None;
        }
        Some(self.base_path.join(&key[..2]).join(key))
    }

    /// Extension taken from the original filename, or "bin".
    fn extension_of(original_name: &str) -> String {
        Path::new(original_name)
            .extension()
            .and_then(|s| s.to_str())
            .filter(|ext| {
                !ext.is_empty() && ext.len() <= 16 && ext.chars().all(|c| c.is_ascii_alphanumeric())
            })
            .map(|ext| ext.to_ascii_lowercase())
            .unwrap_or_else(|| "bin".to_string())
    }

    fn storage_error(action: &str, key: &str, e: io::Error) -> FiledropError {
        tracing::error!(key = %key, error = %e, "blob {} failed", action);
        FiledropError::Storage(format!("failed to {action} blob: {e}"))
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn put(&self, content: &[u8], original_name: &str) -> Result<String> {
        let key = format!("{}.{}", Uuid::new_v4(), Self::extension_of(original_name));
        let path = self
            .blob_path(&key)
            .ok_or_else(|| FiledropError::Storage("generated an invalid key".to_string()))?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| Self::storage_error("write", &key, e))?;
        }
        fs::write(&path, content)
            .await
            .map_err(|e| Self::storage_error("write", &key, e))?;

        tracing::debug!(key = %key, size = content.len(), "blob stored");
        Ok(key)
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        let path = self
            .blob_path(key)
            .ok_or_else(|| FiledropError::NotFound("blob".to_string()))?;

        match fs::read(&path).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(FiledropError::NotFound("blob".to_string()))
            }
            Err(e) => Err(Self::storage_error("read", key, e)),
        }
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let Some(path) = self.blob_path(key) else {
            return Ok(false);
        };

        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(Self::storage_error("delete", key, e)),
        }
    }

    async fn presign(
        &self,
        key: &str,
        download_name: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<String> {
        self.signer.sign_url(key, download_name, expires_at)
    }
}
