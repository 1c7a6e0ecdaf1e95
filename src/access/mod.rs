//! Access gate.
//!
//! [`evaluate`] decides whether an artifact may be described or downloaded.
//! Both the metadata path and the download path call it, so there is
//! exactly one definition of "reachable".

use chrono::{DateTime, Utc};

use crate::artifact::ArtifactRecord;
use crate::auth::{verify_password, PasswordError};
use crate::FiledropError;

/// User-facing message for a missing artifact or unknown link.
pub const NOT_FOUND_MESSAGE: &str = "File not found or link is invalid.";

/// User-facing message for a link past its time limit or download quota.
pub const EXPIRED_MESSAGE: &str = "This link has expired.";

/// User-facing message for a wrong or missing password.
pub const INCORRECT_PASSWORD_MESSAGE: &str = "Incorrect password.";

/// What the caller wants to do with the artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessRequest<'a> {
    /// Read name, size and whether a password is required.
    ///
    /// Never denied for a missing password.
    Metadata,
    /// Obtain a download grant.
    Download {
        /// Password supplied by the recipient.
        password: Option<&'a str>,
    },
}

/// Why access was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialReason {
    /// No such artifact.
    NotFound,
    /// Past the time limit or out of downloads; the two are not distinguished.
    Expired,
    /// The artifact has a password and the supplied one is missing or wrong.
    IncorrectPassword,
}

impl DenialReason {
    /// Message shown to the caller.
    pub fn message(self) -> &'static str {
        match self {
            DenialReason::NotFound => NOT_FOUND_MESSAGE,
            DenialReason::Expired => EXPIRED_MESSAGE,
            DenialReason::IncorrectPassword => INCORRECT_PASSWORD_MESSAGE,
        }
    }
}

impl From<DenialReason> for FiledropError {
    fn from(reason: DenialReason) -> Self {
        match reason {
            DenialReason::NotFound => FiledropError::NotFound("artifact".to_string()),
            DenialReason::Expired => FiledropError::Expired,
            DenialReason::IncorrectPassword => FiledropError::IncorrectPassword,
        }
    }
}

/// Outcome of [`evaluate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    /// Access allowed.
    Permit,
    /// Access refused.
    Denied(DenialReason),
}

impl AccessDecision {
    /// Whether access was allowed.
    pub fn is_permit(&self) -> bool {
        matches!(self, AccessDecision::Permit)
    }

    /// Convert a denial into the matching error.
    pub fn into_result(self) -> crate::Result<()> {
        match self {
            AccessDecision::Permit => Ok(()),
            AccessDecision::Denied(reason) => Err(reason.into()),
        }
    }
}

/// Decide whether `request` is allowed on `record` at `now`.
///
/// Checks run in order and the first failure wins:
/// 1. the record must exist;
/// 2. it must not be past its expiry time;
/// 3. its download quota must not be used up;
/// 4. for downloads, the password must match when one is set.
///
/// The function has no side effects; counting the download is the grant
/// issuer's job.
pub fn evaluate(
    record: Option<&ArtifactRecord>,
    request: AccessRequest<'_>,
    now: DateTime<Utc>,
) -> AccessDecision {
    let Some(record) = record else {
        return AccessDecision::Denied(DenialReason::NotFound);
    };

    if record.is_time_expired(now) || record.is_quota_exhausted() {
        return AccessDecision::Denied(DenialReason::Expired);
    }

    let AccessRequest::Download { password } = request else {
        return AccessDecision::Permit;
    };

    match (record.password_hash.as_deref(), password) {
        (None, _) => AccessDecision::Permit,
        (Some(_), None) => AccessDecision::Denied(DenialReason::IncorrectPassword),
        (Some(hash), Some(supplied)) => match verify_password(supplied, hash) {
            Ok(()) => AccessDecision::Permit,
            Err(PasswordError::InvalidHash) => {
                tracing::warn!(artifact_id = %record.id, "stored password hash is malformed");
                AccessDecision::Denied(DenialReason::IncorrectPassword)
            }
            Err(_) => AccessDecision::Denied(DenialReason::IncorrectPassword),
        },
    }
}
