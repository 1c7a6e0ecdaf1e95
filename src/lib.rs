//! filedrop - expiring, optionally password-protected file sharing links.
//!
//! Uploads are stored in a blob store and described by an artifact record
//! with an optional password, expiry time and download quota. Each upload
//! gets a short link; recipients fetch metadata, then request a
//! short-lived retrieval handle, both through one access gate.

pub mod access;
pub mod artifact;
pub mod auth;
pub mod clock;
pub mod config;
pub mod datetime;
pub mod db;
pub mod error;
pub mod grant;
pub mod identity;
pub mod link;
pub mod logging;
pub mod share;
pub mod storage;
pub mod web;

pub use access::{evaluate, AccessDecision, AccessRequest, DenialReason};
pub use artifact::{ArtifactRecord, ArtifactStore, NewArtifact};
pub use auth::{
    hash_password, hash_secret, validate_password, verify_password, PasswordError,
    ValidationError,
};
pub use clock::{Clock, ManualClock, SharedClock, SystemClock};
pub use config::Config;
pub use db::{Database, NewUser, User, UserRepository};
pub use error::{FiledropError, Result};
pub use grant::{DownloadGrantIssuer, RetrievalHandle};
pub use identity::{Identity, IdentityResolver};
pub use link::{LinkRegistry, ShortLink};
pub use share::{ShareService, Sweeper, UploadRequest};
pub use storage::{BlobStore, HandleSigner, LocalBlobStore, SharedBlobStore};
