//! API handlers.

pub mod auth;
pub mod blob;
pub mod health;
pub mod share;

pub use auth::*;
pub use blob::*;
pub use health::*;
pub use share::*;

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::clock::{Clock, SharedClock};
use crate::config::Config;
use crate::db::Database;
use crate::identity::{IdentityResolver, SessionKeys};
use crate::share::ShareService;
use crate::storage::{HandleSigner, SharedBlobStore};

/// Shared state of all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database (accounts and refresh tokens).
    pub db: Database,
    /// Upload, metadata, download and owner operations.
    pub share: ShareService,
    /// Session token verification and guest ids.
    pub resolver: Arc<IdentityResolver>,
    /// Verifies signed blob retrieval handles.
    pub signer: HandleSigner,
    /// Time source shared with the services.
    pub clock: SharedClock,
    /// Refresh token lifetime in days.
    pub refresh_token_expiry_days: i64,
}

impl AppState {
    /// Wire the services from their collaborators and the configuration.
    pub fn new(
        db: Database,
        blobs: SharedBlobStore,
        signer: HandleSigner,
        clock: SharedClock,
        config: &Config,
    ) -> Self {
        let share = ShareService::new(db.clone(), blobs, clock.clone(), config);
        let keys = SessionKeys::new(
            &config.web.jwt_secret,
            chrono::Duration::seconds(config.web.jwt_access_token_expiry_secs as i64),
            clock.clone(),
        );

        Self {
            db,
            share,
            resolver: Arc::new(IdentityResolver::new(keys)),
            signer,
            clock,
            refresh_token_expiry_days: config.web.jwt_refresh_token_expiry_days as i64,
        }
    }

    /// Current time from the injected clock.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// A new random refresh token.
    pub fn generate_refresh_token(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}
