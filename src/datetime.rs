//! Date/time utilities for filedrop.
//!
//! Timestamps are persisted as UTC text in `YYYY-MM-DD HH:MM:SS` form, which
//! sorts lexicographically in the same order as time and can therefore be
//! compared directly inside SQL conditions.

use chrono::{DateTime, NaiveDateTime, Utc};

/// Storage format for timestamps.
pub const DB_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Format a UTC timestamp for storage.
pub fn to_db(dt: &DateTime<Utc>) -> String {
    dt.format(DB_FORMAT).to_string()
}

/// Parse a stored timestamp.
///
/// Accepts the storage format as well as RFC 3339. Returns `None` if the
/// string is neither.
pub fn parse_db(datetime_str: &str) -> Option<DateTime<Utc>> {
    if let Ok(naive) = NaiveDateTime::parse_from_str(datetime_str, DB_FORMAT) {
        return Some(naive.and_utc());
    }

    DateTime::parse_from_rfc3339(datetime_str)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Convert a database datetime string (YYYY-MM-DD HH:MM:SS) to RFC3339 format.
///
/// The database stores times in UTC, so this function appends 'Z'.
pub fn to_rfc3339(datetime_str: &str) -> String {
    format!("{}Z", datetime_str.replace(' ', "T"))
}

/// Format a UTC timestamp as RFC 3339 with second precision.
pub fn format_rfc3339(dt: &DateTime<Utc>) -> String {
    to_rfc3339(&to_db(dt))
}
