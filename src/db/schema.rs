//! Database schema and migrations for filedrop.
//!
//! Migrations are applied sequentially when the database is first opened
//! or upgraded. Timestamps are UTC text in `YYYY-MM-DD HH:MM:SS` form.

/// Database migrations.
///
/// Each migration is a SQL script executed in order.
/// The schema_version table tracks which migrations have been applied.
pub const MIGRATIONS: &[&str] = &[
    // v1: Accounts
    r#"
CREATE TABLE users (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    username    TEXT NOT NULL UNIQUE COLLATE NOCASE,
    password    TEXT NOT NULL,           -- Argon2 hash
    created_at  TEXT NOT NULL DEFAULT (datetime('now')),
    last_login  TEXT
);
"#,
    // v2: Refresh tokens for account sessions
    r#"
CREATE TABLE refresh_tokens (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id     INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    token       TEXT NOT NULL UNIQUE,
    expires_at  TEXT NOT NULL,
    created_at  TEXT NOT NULL DEFAULT (datetime('now')),
    revoked_at  TEXT
);

CREATE INDEX idx_refresh_tokens_user_id ON refresh_tokens(user_id);
CREATE INDEX idx_refresh_tokens_expires_at ON refresh_tokens(expires_at);
"#,
    // v3: Uploaded artifacts
    r#"
CREATE TABLE artifacts (
    id                TEXT PRIMARY KEY,
    storage_key       TEXT NOT NULL UNIQUE,
    original_name     TEXT NOT NULL,
    size              INTEGER NOT NULL CHECK (size >= 0),
    password_hash     TEXT,                  -- Argon2 hash, NULL = no password
    expires_at        TEXT,                  -- NULL = no time limit
    download_limit    INTEGER CHECK (download_limit IS NULL OR download_limit >= 0),
    download_count    INTEGER NOT NULL DEFAULT 0 CHECK (download_count >= 0),
    owner_id          TEXT NOT NULL,         -- 'user:<id>' or 'guest:<id>'
    created_at        TEXT NOT NULL,
    last_download_at  TEXT
);

CREATE INDEX idx_artifacts_owner ON artifacts(owner_id, created_at);
CREATE INDEX idx_artifacts_expires_at ON artifacts(expires_at);
"#,
    // v4: Short links
    r#"
CREATE TABLE short_links (
    short_id    TEXT PRIMARY KEY,
    target_url  TEXT NOT NULL,
    created_at  TEXT NOT NULL
);

CREATE INDEX idx_short_links_created_at ON short_links(created_at);
"#,
];
