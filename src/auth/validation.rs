//! Input validation for account registration and guest identities.

use thiserror::Error;

/// Minimum username length.
pub const MIN_USERNAME_LENGTH: usize = 3;

/// Maximum username length.
pub const MAX_USERNAME_LENGTH: usize = 32;

/// Minimum guest id length.
pub const MIN_GUEST_ID_LENGTH: usize = 8;

/// Maximum guest id length.
pub const MAX_GUEST_ID_LENGTH: usize = 64;

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Username is too short.
    #[error("username must be at least {MIN_USERNAME_LENGTH} characters")]
    UsernameTooShort,

    /// Username is too long.
    #[error("username must be at most {MAX_USERNAME_LENGTH} characters")]
    UsernameTooLong,

    /// Username contains invalid characters.
    #[error("username can only contain alphanumeric characters and underscores")]
    UsernameInvalidChars,

    /// Username is reserved.
    #[error("this username is reserved")]
    UsernameReserved,

    /// Guest id has the wrong length or characters.
    #[error(
        "guest id must be {MIN_GUEST_ID_LENGTH}-{MAX_GUEST_ID_LENGTH} characters of A-Z, a-z, 0-9, '_' or '-'"
    )]
    GuestIdInvalid,
}

const RESERVED_USERNAMES: &[&str] = &["admin", "guest", "root", "system", "anonymous"];

/// Validate a username.
///
/// Usernames are 3 to 32 ASCII letters, digits or underscores and must not
/// be one of the reserved names (compared case-insensitively).
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    let len = username.chars().count();
    if len < MIN_USERNAME_LENGTH {
        return Err(ValidationError::UsernameTooShort);
    }
    if len > MAX_USERNAME_LENGTH {
        return Err(ValidationError::UsernameTooLong);
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(ValidationError::UsernameInvalidChars);
    }
    let lower = username.to_ascii_lowercase();
    if RESERVED_USERNAMES.contains(&lower.as_str()) {
        return Err(ValidationError::UsernameReserved);
    }
    Ok(())
}

/// Validate a client-chosen guest identifier.
pub fn validate_guest_id(guest_id: &str) -> Result<(), ValidationError> {
    let len = guest_id.len();
    let charset_ok = guest_id
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-');
    if !(MIN_GUEST_ID_LENGTH..=MAX_GUEST_ID_LENGTH).contains(&len) || !charset_ok {
        return Err(ValidationError::GuestIdInvalid);
    }
    Ok(())
}
