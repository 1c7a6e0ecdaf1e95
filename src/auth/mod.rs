//! Authentication module for filedrop.
//!
//! This module provides password hashing for accounts and artifacts and
//! input validation for usernames and guest identities.

mod password;
pub mod validation;

pub use password::{
    hash_password, hash_secret, validate_password, validate_secret, verify_password,
    PasswordError, MAX_PASSWORD_LENGTH, MIN_PASSWORD_LENGTH,
};
pub use validation::{validate_guest_id, validate_username, ValidationError};
