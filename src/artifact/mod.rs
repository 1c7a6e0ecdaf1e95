//! Artifact record store.
//!
//! Metadata for every uploaded file: where its bytes live, who uploaded it,
//! its optional password and its expiry policy (time limit and download
//! quota), plus the download counter.

mod record;
mod repository;
mod store;

pub use record::{ArtifactRecord, NewArtifact};
pub use repository::ArtifactRepository;
pub use store::{ArtifactStore, MAX_EXPIRY_HOURS};
