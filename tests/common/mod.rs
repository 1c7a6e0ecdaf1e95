//! Test helpers for HTTP API tests.
//!
//! Builds the full router over an in-memory database, a temporary blob
//! directory and a manual clock, so tests can fast-forward time.

#![allow(dead_code)]

use std::sync::Arc;

use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use filedrop::web::{AppState, WebServer};
use filedrop::{Config, Database, HandleSigner, LocalBlobStore, ManualClock};
use serde_json::Value;
use tempfile::TempDir;

/// Guest id used by most tests.
pub const GUEST: &str = "browser-guest-1";

/// Another guest id.
pub const OTHER_GUEST: &str = "browser-guest-2";

/// A running test application.
pub struct TestApp {
    /// In-process HTTP server.
    pub server: TestServer,
    /// Clock shared with every service.
    pub clock: Arc<ManualClock>,
    /// Database behind the server.
    pub db: Database,
    /// Configuration the server was built with.
    pub config: Config,
    _temp: TempDir,
}

/// Create a test configuration.
pub fn create_test_config() -> Config {
    let mut config = Config::default();
    config.server.host = "127.0.0.1".to_string();
    config.server.port = 0;
    config.server.public_url = "http://files.test".to_string();
    config.server.frontend_url = "http://app.test".to_string();
    config.storage.max_upload_size_mb = 1;
    config.web.jwt_secret = "test-secret-key-for-testing-only".to_string();
    config.web.login_rate_limit = 100;
    config.web.api_rate_limit = 1000;
    config
}

/// Create a test app with the default test configuration.
pub async fn create_test_app() -> TestApp {
    create_test_app_with(create_test_config()).await
}

/// Create a test app with a custom configuration.
pub async fn create_test_app_with(config: Config) -> TestApp {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let db = Database::open_in_memory()
        .await
        .expect("Failed to create test database");
    let clock = Arc::new(ManualClock::starting_now());

    let signer = HandleSigner::new(&config.web.jwt_secret, &config.server.public_url);
    let blobs = Arc::new(
        LocalBlobStore::new(temp.path().join("blobs"), signer.clone())
            .expect("Failed to create blob store"),
    );
    let state = AppState::new(db.clone(), blobs, signer, clock.clone(), &config);
    let router = WebServer::new(&config, state)
        .expect("Failed to create web server")
        .router();

    let server = TestServer::new(router).expect("Failed to create test server");

    TestApp {
        server,
        clock,
        db,
        config,
        _temp: temp,
    }
}

/// Multipart form with just a file.
pub fn file_form(name: &str, content: &[u8]) -> MultipartForm {
    MultipartForm::new().add_part(
        "file",
        Part::bytes(content.to_vec())
            .file_name(name.to_string())
            .mime_type("application/octet-stream"),
    )
}

/// Upload a file as `GUEST` and return the JSON response.
pub async fn upload(app: &TestApp, form: MultipartForm) -> Value {
    let response = app
        .server
        .post("/api/upload")
        .add_header("x-guest-id", GUEST)
        .multipart(form)
        .await;
    response.assert_status_ok();
    response.json::<Value>()
}

/// Path part of an absolute URL issued by the server.
pub fn path_of(app: &TestApp, url: &str) -> String {
    url.strip_prefix(&app.config.server.public_url)
        .expect("URL outside the public base")
        .to_string()
}
