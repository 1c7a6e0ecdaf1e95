//! Identity resolver.
//!
//! Maps a request to the owner identity used to scope "my uploads": a
//! verified account from a signed session token, or otherwise a guest id the
//! caller chose for itself. A guest id is only a scoping key. It never
//! grants access to an artifact; anyone holding a link is a recipient.

mod session;

pub use session::{IssuedToken, SessionClaims, SessionKeys};

use crate::auth::validate_guest_id;

/// Header carrying a guest identifier.
pub const GUEST_ID_HEADER: &str = "x-guest-id";

/// Cookie carrying the account session token.
pub const SESSION_COOKIE: &str = "filedrop_session";

/// Who is making a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    /// Signed-in account.
    Account {
        /// Account ID.
        user_id: i64,
        /// Account username.
        username: String,
    },
    /// Unauthenticated caller with a self-declared identifier.
    Guest {
        /// Caller-chosen identifier.
        guest_id: String,
    },
}

impl Identity {
    /// Key stored as `owner_id` on artifacts.
    pub fn owner_key(&self) -> String {
        match self {
            Identity::Account { user_id, .. } => format!("user:{user_id}"),
            Identity::Guest { guest_id } => format!("guest:{guest_id}"),
        }
    }

    /// Whether this is a guest identity.
    pub fn is_guest(&self) -> bool {
        matches!(self, Identity::Guest { .. })
    }
}

/// Resolves identities from session tokens and guest ids.
#[derive(Clone)]
pub struct IdentityResolver {
    keys: SessionKeys,
}

impl IdentityResolver {
    /// Create a resolver verifying tokens with `keys`.
    pub fn new(keys: SessionKeys) -> Self {
        Self { keys }
    }

    /// Session keys used for verification.
    pub fn keys(&self) -> &SessionKeys {
        &self.keys
    }

    /// Resolve an identity.
    ///
    /// A valid session token wins. An invalid or expired token is ignored
    /// and the guest id, if well formed, is used instead.
    pub fn resolve(&self, session_token: Option<&str>, guest_id: Option<&str>) -> Option<Identity> {
        if let Some(token) = session_token {
            match self.keys.verify(token) {
                Ok(claims) => {
                    return Some(Identity::Account {
                        user_id: claims.sub,
                        username: claims.username,
                    })
                }
                Err(e) => tracing::debug!("session token ignored: {}", e),
            }
        }

        let guest_id = guest_id?.trim();
        match validate_guest_id(guest_id) {
            Ok(()) => Some(Identity::Guest {
                guest_id: guest_id.to_string(),
            }),
            Err(e) => {
                tracing::debug!("guest id ignored: {}", e);
                None
            }
        }
    }
}
