//! Configuration module for filedrop.

use serde::Deserialize;
use std::path::Path;

use crate::{FiledropError, Result};

/// Minimum short-link token length accepted by [`Config::validate`].
pub const MIN_SHORT_ID_LENGTH: usize = 7;

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public base URL of this server (short links and blob handles).
    #[serde(default = "default_public_url")]
    pub public_url: String,
    /// Base URL of the frontend hosting the download page.
    #[serde(default = "default_frontend_url")]
    pub frontend_url: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_public_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_frontend_url() -> String {
    "http://localhost:3000".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            public_url: default_public_url(),
            frontend_url: default_frontend_url(),
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,
}

fn default_db_path() -> String {
    "data/filedrop.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Blob storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Path to the blob storage directory.
    #[serde(default = "default_storage_path")]
    pub path: String,
    /// Maximum upload size in megabytes.
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size_mb: u64,
    /// Lifetime of a retrieval handle in seconds.
    #[serde(default = "default_grant_ttl")]
    pub grant_ttl_secs: u64,
}

fn default_storage_path() -> String {
    "data/blobs".to_string()
}

fn default_max_upload_size() -> u64 {
    10
}

fn default_grant_ttl() -> u64 {
    300 // 5 minutes
}

impl StorageConfig {
    /// Maximum upload size in bytes.
    pub fn max_upload_size_bytes(&self) -> u64 {
        self.max_upload_size_mb * 1024 * 1024
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_storage_path(),
            max_upload_size_mb: default_max_upload_size(),
            grant_ttl_secs: default_grant_ttl(),
        }
    }
}

/// Short link configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LinksConfig {
    /// Length of generated short ids.
    #[serde(default = "default_short_id_length")]
    pub short_id_length: usize,
    /// Days a short link stays resolvable.
    #[serde(default = "default_link_retention_days")]
    pub retention_days: u64,
    /// Fresh ids to try after a collision before giving up.
    #[serde(default = "default_max_collision_retries")]
    pub max_collision_retries: u32,
}

fn default_short_id_length() -> usize {
    8
}

fn default_link_retention_days() -> u64 {
    7
}

fn default_max_collision_retries() -> u32 {
    5
}

impl Default for LinksConfig {
    fn default() -> Self {
        Self {
            short_id_length: default_short_id_length(),
            retention_days: default_link_retention_days(),
            max_collision_retries: default_max_collision_retries(),
        }
    }
}

/// Background retention configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RetentionConfig {
    /// Sweep interval in seconds.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
    /// Hours an expired artifact is kept before its blob and record are purged.
    #[serde(default = "default_artifact_grace_hours")]
    pub artifact_grace_hours: u64,
}

fn default_sweep_interval() -> u64 {
    3600 // 1 hour
}

fn default_artifact_grace_hours() -> u64 {
    24
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            sweep_interval_secs: default_sweep_interval(),
            artifact_grace_hours: default_artifact_grace_hours(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/filedrop.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Web API configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    /// CORS allowed origins.
    #[serde(default)]
    pub cors_origins: Vec<String>,
    /// JWT secret key. Signs session tokens and retrieval handles.
    #[serde(default)]
    pub jwt_secret: String,
    /// Access token expiry in seconds.
    #[serde(default = "default_jwt_access_expiry")]
    pub jwt_access_token_expiry_secs: u64,
    /// Refresh token expiry in days.
    #[serde(default = "default_jwt_refresh_expiry")]
    pub jwt_refresh_token_expiry_days: u64,
    /// Rate limit for login endpoint (requests per minute).
    #[serde(default = "default_login_rate_limit")]
    pub login_rate_limit: u32,
    /// Rate limit for general API endpoints (requests per minute).
    #[serde(default = "default_api_rate_limit")]
    pub api_rate_limit: u32,
}

fn default_jwt_access_expiry() -> u64 {
    900 // 15 minutes
}

fn default_jwt_refresh_expiry() -> u64 {
    7
}

fn default_login_rate_limit() -> u32 {
    5
}

fn default_api_rate_limit() -> u32 {
    100
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            cors_origins: vec![],
            jwt_secret: String::new(),
            jwt_access_token_expiry_secs: default_jwt_access_expiry(),
            jwt_refresh_token_expiry_days: default_jwt_refresh_expiry(),
            login_rate_limit: default_login_rate_limit(),
            api_rate_limit: default_api_rate_limit(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Blob storage configuration.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Short link configuration.
    #[serde(default)]
    pub links: LinksConfig,
    /// Retention sweep configuration.
    #[serde(default)]
    pub retention: RetentionConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Web API configuration.
    #[serde(default)]
    pub web: WebConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(FiledropError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| FiledropError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `FILEDROP_JWT_SECRET`: Override the JWT secret key
    /// - `FILEDROP_PUBLIC_URL`: Override the public base URL
    pub fn apply_env_overrides(&mut self) {
        if let Ok(jwt_secret) = std::env::var("FILEDROP_JWT_SECRET") {
            if !jwt_secret.is_empty() {
                self.web.jwt_secret = jwt_secret;
            }
        }
        if let Ok(public_url) = std::env::var("FILEDROP_PUBLIC_URL") {
            if !public_url.is_empty() {
                self.server.public_url = public_url;
            }
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.web.jwt_secret.is_empty() {
            return Err(FiledropError::Config(
                "jwt_secret is not set. \
                 Set it in config.toml or via FILEDROP_JWT_SECRET environment variable."
                    .to_string(),
            ));
        }
        for (name, value) in [
            ("server.public_url", &self.server.public_url),
            ("server.frontend_url", &self.server.frontend_url),
        ] {
            url::Url::parse(value)
                .map_err(|e| FiledropError::Config(format!("{name} is not a valid URL: {e}")))?;
        }
        if self.links.short_id_length < MIN_SHORT_ID_LENGTH {
            return Err(FiledropError::Config(format!(
                "links.short_id_length must be at least {MIN_SHORT_ID_LENGTH}"
            )));
        }
        if self.links.max_collision_retries == 0 {
            return Err(FiledropError::Config(
                "links.max_collision_retries must be at least 1".to_string(),
            ));
        }
        if self.storage.grant_ttl_secs == 0 {
            return Err(FiledropError::Config(
                "storage.grant_ttl_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        let mut config = Config::default();
        config.web.jwt_secret = "secret".to_string();
        config
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.server.public_url, "http://localhost:5000");
        assert_eq!(config.server.frontend_url, "http://localhost:3000");

        assert_eq!(config.database.path, "data/filedrop.db");

        assert_eq!(config.storage.path, "data/blobs");
        assert_eq!(config.storage.max_upload_size_mb, 10);
        assert_eq!(config.storage.max_upload_size_bytes(), 10 * 1024 * 1024);
        assert_eq!(config.storage.grant_ttl_secs, 300);

        assert_eq!(config.links.short_id_length, 8);
        assert_eq!(config.links.retention_days, 7);
        assert_eq!(config.links.max_collision_retries, 5);

        assert_eq!(config.retention.sweep_interval_secs, 3600);
        assert_eq!(config.retention.artifact_grace_hours, 24);

        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.file, "logs/filedrop.log");

        assert!(config.web.cors_origins.is_empty());
        assert!(config.web.jwt_secret.is_empty());
        assert_eq!(config.web.jwt_access_token_expiry_secs, 900);
        assert_eq!(config.web.jwt_refresh_token_expiry_days, 7);
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[server]
host = "127.0.0.1"
port = 8080
public_url = "https://drop.example.com"
frontend_url = "https://app.example.com"

[database]
path = "custom/db.sqlite"

[storage]
path = "custom/blobs"
max_upload_size_mb = 50
grant_ttl_secs = 60

[links]
short_id_length = 10
retention_days = 14
max_collision_retries = 3

[retention]
sweep_interval_secs = 600
artifact_grace_hours = 48

[logging]
level = "debug"
file = "custom/logs/app.log"

[web]
cors_origins = ["http://localhost:3000"]
jwt_secret = "test-secret-key"
jwt_access_token_expiry_secs = 600
jwt_refresh_token_expiry_days = 14
login_rate_limit = 10
api_rate_limit = 500
"#;

        let config = Config::parse(toml).unwrap();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.public_url, "https://drop.example.com");
        assert_eq!(config.server.frontend_url, "https://app.example.com");
        assert_eq!(config.database.path, "custom/db.sqlite");
        assert_eq!(config.storage.path, "custom/blobs");
        assert_eq!(config.storage.max_upload_size_mb, 50);
        assert_eq!(config.storage.grant_ttl_secs, 60);
        assert_eq!(config.links.short_id_length, 10);
        assert_eq!(config.links.retention_days, 14);
        assert_eq!(config.links.max_collision_retries, 3);
        assert_eq!(config.retention.sweep_interval_secs, 600);
        assert_eq!(config.retention.artifact_grace_hours, 48);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.web.cors_origins, vec!["http://localhost:3000"]);
        assert_eq!(config.web.jwt_secret, "test-secret-key");
        assert_eq!(config.web.login_rate_limit, 10);
        assert_eq!(config.web.api_rate_limit, 500);
    }

    #[test]
    fn test_parse_partial_config() {
        let toml = r#"
[server]
port = 3000

[links]
retention_days = 30
"#;

        let config = Config::parse(toml).unwrap();

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.links.retention_days, 30);

        // Defaults
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.links.short_id_length, 8);
        assert_eq!(config.database.path, "data/filedrop.db");
    }

    #[test]
    fn test_parse_empty_config() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.storage.grant_ttl_secs, 300);
    }

    #[test]
    fn test_parse_invalid_config() {
        let result = Config::parse("this is not valid toml [[[");

        if let Err(FiledropError::Config(msg)) = result {
            assert!(msg.contains("config parse error"));
        } else {
            panic!("Expected Config error");
        }
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = Config::load("nonexistent.toml");
        assert!(matches!(result, Err(FiledropError::Io(_))));
    }

    #[test]
    fn test_apply_env_overrides() {
        let original_secret = std::env::var("FILEDROP_JWT_SECRET").ok();
        let original_url = std::env::var("FILEDROP_PUBLIC_URL").ok();

        std::env::set_var("FILEDROP_JWT_SECRET", "env-secret-key");
        std::env::set_var("FILEDROP_PUBLIC_URL", "");

        let mut config = Config::default();
        config.apply_env_overrides();

        assert_eq!(config.web.jwt_secret, "env-secret-key");
        // Empty values do not override
        assert_eq!(config.server.public_url, "http://localhost:5000");

        match original_secret {
            Some(val) => std::env::set_var("FILEDROP_JWT_SECRET", val),
            None => std::env::remove_var("FILEDROP_JWT_SECRET"),
        }
        match original_url {
            Some(val) => std::env::set_var("FILEDROP_PUBLIC_URL", val),
            None => std::env::remove_var("FILEDROP_PUBLIC_URL"),
        }
    }

    #[test]
    fn test_validate_no_secret() {
        let config = Config::default();
        match config.validate() {
            Err(FiledropError::Config(msg)) => assert!(msg.contains("jwt_secret")),
            other => panic!("Expected Config error, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_ok() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_validate_bad_url() {
        let mut config = valid_config();
        config.server.public_url = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_short_id_too_short() {
        let mut config = valid_config();
        config.links.short_id_length = 4;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_zero_retries() {
        let mut config = valid_config();
        config.links.max_collision_retries = 0;
        assert!(config.validate().is_err());
    }
}
