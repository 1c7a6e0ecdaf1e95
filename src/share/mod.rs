//! File sharing flows.
//!
//! Ties the artifact store, link registry, access gate and grant issuer
//! together:
//! - Upload: store the blob, create the record, mint the short link
//! - Metadata and download, both gated by the access gate
//! - Owner listing and deletion
//! - Background retention sweep

mod service;
mod sweeper;

pub use service::{
    ArtifactMetadata, ShareService, ShareSettings, UploadOutcome, UploadRequest,
    ANONYMOUS_OWNER, MAX_FILENAME_LENGTH,
};
pub use sweeper::{SweepReport, Sweeper};
