//! Web API Auth Tests
//!
//! Integration tests for account endpoints and identity resolution.

mod common;

use axum::http::header::AUTHORIZATION;
use axum::http::StatusCode;
use axum_test::TestServer;
use chrono::Duration;
use common::{create_test_app, file_form, GUEST};
use serde_json::{json, Value};

/// Helper to register a test user and return the login response.
async fn register_test_user(server: &TestServer, username: &str, password: &str) -> Value {
    let response = server
        .post("/api/auth/register")
        .json(&json!({
            "username": username,
            "password": password
        }))
        .await;

    response.assert_status_ok();
    response.json::<Value>()
}

#[tokio::test]
async fn test_register_returns_tokens() {
    let app = create_test_app().await;

    let body = register_test_user(&app.server, "alice", "password123").await;

    assert!(body["access_token"].as_str().is_some());
    assert!(body["refresh_token"].as_str().is_some());
    assert_eq!(body["expires_in"], 900);
    assert_eq!(body["user"]["username"], "alice");
}

#[tokio::test]
async fn test_register_sets_session_cookie() {
    let app = create_test_app().await;

    let response = app
        .server
        .post("/api/auth/register")
        .json(&json!({ "username": "alice", "password": "password123" }))
        .await;

    let cookie = response.cookie("filedrop_session");
    assert!(!cookie.value().is_empty());
    assert_eq!(cookie.http_only(), Some(true));
}

#[tokio::test]
async fn test_register_duplicate_username() {
    let app = create_test_app().await;
    register_test_user(&app.server, "alice", "password123").await;

    let response = app
        .server
        .post("/api/auth/register")
        .json(&json!({ "username": "ALICE", "password": "password456" }))
        .await;

    response.assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_register_validation() {
    let app = create_test_app().await;

    let response = app
        .server
        .post("/api/auth/register")
        .json(&json!({ "username": "al", "password": "password123" }))
        .await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    let error: Value = response.json();
    assert_eq!(error["code"], "VALIDATION_ERROR");
    assert!(error["details"]["username"].is_array());

    app.server
        .post("/api/auth/register")
        .json(&json!({ "username": "alice", "password": "short" }))
        .await
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY);

    app.server
        .post("/api/auth/register")
        .json(&json!({ "username": "admin", "password": "password123" }))
        .await
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_login() {
    let app = create_test_app().await;
    register_test_user(&app.server, "alice", "password123").await;

    let response = app
        .server
        .post("/api/auth/login")
        .json(&json!({ "username": "alice", "password": "password123" }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["user"]["username"], "alice");

    app.server
        .post("/api/auth/login")
        .json(&json!({ "username": "alice", "password": "wrongpassword" }))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    app.server
        .post("/api/auth/login")
        .json(&json!({ "username": "nobody", "password": "password123" }))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_invalid_json() {
    let app = create_test_app().await;

    app.server
        .post("/api/auth/login")
        .text("not json")
        .content_type("application/json")
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_me_for_account_and_guest() {
    let app = create_test_app().await;
    let tokens = register_test_user(&app.server, "alice", "password123").await;
    let access_token = tokens["access_token"].as_str().unwrap();

    let response = app
        .server
        .get("/api/auth/me")
        .add_header(AUTHORIZATION, format!("Bearer {}", access_token))
        .await;
    response.assert_status_ok();
    let me: Value = response.json();
    assert_eq!(me["kind"], "account");
    assert_eq!(me["username"], "alice");
    assert!(me.get("guest_id").is_none());

    let me: Value = app
        .server
        .get("/api/auth/me")
        .add_header("x-guest-id", GUEST)
        .await
        .json();
    assert_eq!(me["kind"], "guest");
    assert_eq!(me["guest_id"], GUEST);

    app.server
        .get("/api/auth/me")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_access_token_expires_with_clock() {
    let app = create_test_app().await;
    let tokens = register_test_user(&app.server, "alice", "password123").await;
    let access_token = tokens["access_token"].as_str().unwrap();

    app.clock.advance(Duration::minutes(16));

    app.server
        .get("/api/auth/me")
        .add_header(AUTHORIZATION, format!("Bearer {}", access_token))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_rotates_token() {
    let app = create_test_app().await;
    let tokens = register_test_user(&app.server, "alice", "password123").await;
    let refresh_token = tokens["refresh_token"].as_str().unwrap();

    let response = app
        .server
        .post("/api/auth/refresh")
        .json(&json!({ "refresh_token": refresh_token }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_ne!(body["refresh_token"], tokens["refresh_token"]);

    // The old refresh token was consumed
    app.server
        .post("/api/auth/refresh")
        .json(&json!({ "refresh_token": refresh_token }))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_revokes_refresh_token() {
    let app = create_test_app().await;
    let tokens = register_test_user(&app.server, "alice", "password123").await;
    let refresh_token = tokens["refresh_token"].as_str().unwrap();

    app.server
        .post("/api/auth/logout")
        .json(&json!({ "refresh_token": refresh_token }))
        .await
        .assert_status_ok();

    app.server
        .post("/api/auth/refresh")
        .json(&json!({ "refresh_token": refresh_token }))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    // Logging out without a body still succeeds
    app.server.post("/api/auth/logout").await.assert_status_ok();
}

#[tokio::test]
async fn test_account_uploads_are_listed_for_account() {
    let app = create_test_app().await;
    let tokens = register_test_user(&app.server, "alice", "password123").await;
    let bearer = format!("Bearer {}", tokens["access_token"].as_str().unwrap());

    app.server
        .post("/api/upload")
        .add_header(AUTHORIZATION, bearer.clone())
        .multipart(file_form("report.txt", b"numbers"))
        .await
        .assert_status_ok();

    let entries: Value = app
        .server
        .get("/api/files")
        .add_header(AUTHORIZATION, bearer)
        .await
        .json();
    assert_eq!(entries.as_array().unwrap().len(), 1);
    assert_eq!(entries[0]["name"], "report.txt");

    // Same browser as a guest sees nothing
    let entries: Value = app
        .server
        .get("/api/files")
        .add_header("x-guest-id", GUEST)
        .await
        .json();
    assert!(entries.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_login_rate_limit() {
    let mut config = common::create_test_config();
    config.web.login_rate_limit = 2;
    let app = common::create_test_app_with(config).await;

    for _ in 0..2 {
        app.server
            .post("/api/auth/login")
            .json(&json!({ "username": "nobody", "password": "password123" }))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    let response = app
        .server
        .post("/api/auth/login")
        .json(&json!({ "username": "nobody", "password": "password123" }))
        .await;
    response.assert_status(StatusCode::TOO_MANY_REQUESTS);
    let error: Value = response.json();
    assert_eq!(error["code"], "TOO_MANY_REQUESTS");
}
