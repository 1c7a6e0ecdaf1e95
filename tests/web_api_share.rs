//! Web API Share Tests
//!
//! Integration tests for upload, metadata, download, short links, blob
//! retrieval and the owner listing.

mod common;

use axum::http::StatusCode;
use axum_test::multipart::MultipartForm;
use chrono::Duration;
use common::{create_test_app, file_form, path_of, upload, GUEST, OTHER_GUEST};
use serde_json::{json, Value};

#[tokio::test]
async fn test_upload_returns_short_link() {
    let app = create_test_app().await;

    let body = upload(&app, file_form("hello.txt", b"hello world")).await;

    assert_eq!(body["success"], true);
    let short_id = body["shortId"].as_str().unwrap();
    assert_eq!(short_id.len(), 8);
    assert_eq!(
        body["link"].as_str().unwrap(),
        format!("http://files.test/s/{short_id}")
    );
    assert!(body["fileId"].as_str().is_some());
}

#[tokio::test]
async fn test_download_limit_one_allows_single_download() {
    let app = create_test_app().await;
    let form = file_form("once.txt", b"only once").add_text("downloadLimit", "1");
    let body = upload(&app, form).await;
    let id = body["fileId"].as_str().unwrap();

    let first = app.server.post(&format!("/api/files/{id}/download")).await;
    first.assert_status_ok();
    let grant: Value = first.json();
    assert_eq!(grant["name"], "once.txt");
    assert!(grant["url"].as_str().unwrap().starts_with("http://files.test/blobs/"));

    let second = app.server.post(&format!("/api/files/{id}/download")).await;
    second.assert_status(StatusCode::BAD_REQUEST);
    let error: Value = second.json();
    assert_eq!(error["code"], "EXPIRED");
    assert_eq!(error["message"], "This link has expired.");

    // Metadata is denied the same way once the quota is used up
    let meta = app.server.get(&format!("/api/files/{id}/meta")).await;
    meta.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_time_expired_metadata_hides_details() {
    let app = create_test_app().await;
    let form = file_form("secret-plans.pdf", b"%PDF").add_text("expiresInHours", "1");
    let body = upload(&app, form).await;
    let id = body["fileId"].as_str().unwrap();

    app.server
        .get(&format!("/api/files/{id}/meta"))
        .await
        .assert_status_ok();

    app.clock.advance(Duration::hours(2));

    let response = app.server.get(&format!("/api/files/{id}/meta")).await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let error: Value = response.json();
    assert_eq!(error["message"], "This link has expired.");
    assert!(error.get("name").is_none());
    assert!(error.get("size").is_none());
    assert!(!response.text().contains("secret-plans"));
}

#[tokio::test]
async fn test_password_protected_download() {
    let app = create_test_app().await;
    let form = file_form("private.txt", b"top secret").add_text("password", "secret1!");
    let body = upload(&app, form).await;
    let id = body["fileId"].as_str().unwrap();

    let meta: Value = app
        .server
        .get(&format!("/api/files/{id}/meta"))
        .await
        .json();
    assert_eq!(meta["hasPassword"], true);

    let wrong = app
        .server
        .post(&format!("/api/files/{id}/download"))
        .json(&json!({ "password": "wrong" }))
        .await;
    wrong.assert_status(StatusCode::UNAUTHORIZED);
    let error: Value = wrong.json();
    assert_eq!(error["code"], "INCORRECT_PASSWORD");
    assert_eq!(error["message"], "Incorrect password.");

    let missing = app.server.post(&format!("/api/files/{id}/download")).await;
    missing.assert_status(StatusCode::UNAUTHORIZED);

    let right = app
        .server
        .post(&format!("/api/files/{id}/download"))
        .json(&json!({ "password": "secret1!" }))
        .await;
    right.assert_status_ok();
    let grant: Value = right.json();
    assert!(grant["url"].as_str().is_some());
    assert!(grant["expiresAt"].as_str().is_some());
}

#[tokio::test]
async fn test_unprotected_download_without_body() {
    let app = create_test_app().await;
    let body = upload(&app, file_form("open.txt", b"for everyone")).await;
    let id = body["fileId"].as_str().unwrap();

    let meta: Value = app
        .server
        .get(&format!("/api/files/{id}/meta"))
        .await
        .json();
    assert_eq!(meta["id"], id);
    assert_eq!(meta["name"], "open.txt");
    assert_eq!(meta["size"], 12);
    assert_eq!(meta["hasPassword"], false);

    app.server
        .post(&format!("/api/files/{id}/download"))
        .await
        .assert_status_ok();

    // A password sent for an unprotected file is ignored
    app.server
        .post(&format!("/api/files/{id}/download"))
        .json(&json!({ "password": "anything" }))
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn test_unknown_file() {
    let app = create_test_app().await;

    let response = app.server.get("/api/files/does-not-exist/meta").await;
    response.assert_status(StatusCode::NOT_FOUND);
    let error: Value = response.json();
    assert_eq!(error["message"], "File not found or link is invalid.");

    app.server
        .post("/api/files/does-not-exist/download")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_short_link_redirects_to_file_page() {
    let app = create_test_app().await;
    let body = upload(&app, file_form("a.txt", b"a")).await;
    let short_id = body["shortId"].as_str().unwrap();
    let id = body["fileId"].as_str().unwrap();

    let response = app.server.get(&format!("/s/{short_id}")).await;
    response.assert_status(StatusCode::FOUND);
    assert_eq!(
        response.header("location").to_str().unwrap(),
        format!("http://app.test/download/{id}")
    );
}

#[tokio::test]
async fn test_short_link_not_found_and_retention() {
    let app = create_test_app().await;

    app.server
        .get("/s/nosuchid")
        .await
        .assert_status(StatusCode::NOT_FOUND);

    let body = upload(&app, file_form("a.txt", b"a")).await;
    let short_id = body["shortId"].as_str().unwrap();

    app.clock.advance(Duration::days(8));

    let response = app.server.get(&format!("/s/{short_id}")).await;
    response.assert_status(StatusCode::NOT_FOUND);
    let error: Value = response.json();
    assert_eq!(error["message"], "File not found or link is invalid.");
}

#[tokio::test]
async fn test_short_link_outlives_expired_file() {
    let app = create_test_app().await;
    let form = file_form("brief.txt", b"brief").add_text("expiresInHours", "1");
    let body = upload(&app, form).await;
    let short_id = body["shortId"].as_str().unwrap();
    let id = body["fileId"].as_str().unwrap();

    app.clock.advance(Duration::hours(2));

    // The redirect does not look at the file; the page it points to does
    app.server
        .get(&format!("/s/{short_id}"))
        .await
        .assert_status(StatusCode::FOUND);

    let response = app.server.get(&format!("/api/files/{id}/meta")).await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let error: Value = response.json();
    assert_eq!(error["message"], "This link has expired.");
}

#[tokio::test]
async fn test_file_outlives_short_link() {
    let app = create_test_app().await;
    let body = upload(&app, file_form("lasting.txt", b"lasting")).await;
    let short_id = body["shortId"].as_str().unwrap();
    let id = body["fileId"].as_str().unwrap();

    app.clock.advance(Duration::days(8));

    app.server
        .get(&format!("/s/{short_id}"))
        .await
        .assert_status(StatusCode::NOT_FOUND);

    let meta: Value = app
        .server
        .get(&format!("/api/files/{id}/meta"))
        .await
        .json();
    assert_eq!(meta["name"], "lasting.txt");
}

#[tokio::test]
async fn test_malformed_download_body_is_rejected() {
    let app = create_test_app().await;
    let form = file_form("once.txt", b"only once").add_text("downloadLimit", "1");
    let body = upload(&app, form).await;
    let id = body["fileId"].as_str().unwrap();
    let path = format!("/api/files/{id}/download");

    app.server
        .post(&path)
        .text("{not json")
        .content_type("application/json")
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    app.server
        .post(&path)
        .json(&json!({ "password": 123 }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    app.server
        .post(&path)
        .text("{}")
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    let entries: Value = app
        .server
        .get("/api/files")
        .add_header("x-guest-id", GUEST)
        .await
        .json();
    assert_eq!(entries[0]["downloadCount"], 0);

    // The quota is still there for a well-formed request
    app.server.post(&path).await.assert_status_ok();
}

#[tokio::test]
async fn test_blob_fetch_with_retrieval_handle() {
    let app = create_test_app().await;
    let body = upload(&app, file_form("notes.txt", b"line one\nline two\n")).await;
    let id = body["fileId"].as_str().unwrap();

    let grant: Value = app
        .server
        .post(&format!("/api/files/{id}/download"))
        .await
        .json();
    let path = path_of(&app, grant["url"].as_str().unwrap());

    let response = app.server.get(&path).await;
    response.assert_status_ok();
    assert_eq!(response.as_bytes().as_ref(), b"line one\nline two\n");
    assert_eq!(
        response.header("content-disposition").to_str().unwrap(),
        "attachment; filename=\"notes.txt\""
    );
    assert!(response
        .header("content-type")
        .to_str()
        .unwrap()
        .starts_with("text/plain"));

    // Fetching the bytes does not count as another download
    let entries: Value = app
        .server
        .get("/api/files")
        .add_header("x-guest-id", GUEST)
        .await
        .json();
    assert_eq!(entries[0]["downloadCount"], 1);
}

#[tokio::test]
async fn test_retrieval_handle_expires() {
    let app = create_test_app().await;
    let body = upload(&app, file_form("a.txt", b"a")).await;
    let id = body["fileId"].as_str().unwrap();

    let grant: Value = app
        .server
        .post(&format!("/api/files/{id}/download"))
        .await
        .json();
    let path = path_of(&app, grant["url"].as_str().unwrap());

    app.clock.advance(Duration::minutes(6));

    app.server
        .get(&path)
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
    app.server
        .get("/blobs/not-a-token")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_listing_is_scoped_to_identity() {
    let app = create_test_app().await;
    let first = upload(&app, file_form("first.txt", b"1")).await;
    let second = upload(
        &app,
        file_form("second.txt", b"22").add_text("downloadLimit", "3"),
    )
    .await;

    let entries: Value = app
        .server
        .get("/api/files")
        .add_header("x-guest-id", GUEST)
        .await
        .json();
    let entries = entries.as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["id"], second["fileId"]);
    assert_eq!(entries[0]["downloadLimit"], 3);
    assert_eq!(entries[0]["expired"], false);
    assert_eq!(entries[1]["id"], first["fileId"]);
    assert!(entries[1]["downloadLimit"].is_null());

    let others: Value = app
        .server
        .get("/api/files")
        .add_header("x-guest-id", OTHER_GUEST)
        .await
        .json();
    assert!(others.as_array().unwrap().is_empty());

    app.server
        .get("/api/files")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_delete_is_owner_only() {
    let app = create_test_app().await;
    let body = upload(&app, file_form("mine.txt", b"mine")).await;
    let id = body["fileId"].as_str().unwrap();

    app.server
        .delete(&format!("/api/files/{id}"))
        .add_header("x-guest-id", OTHER_GUEST)
        .await
        .assert_status(StatusCode::NOT_FOUND);

    app.server
        .delete(&format!("/api/files/{id}"))
        .add_header("x-guest-id", GUEST)
        .await
        .assert_status_ok();

    app.server
        .get(&format!("/api/files/{id}/meta"))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_upload_validation() {
    let app = create_test_app().await;

    let response = app
        .server
        .post("/api/upload")
        .multipart(MultipartForm::new().add_text("password", "x"))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    app.server
        .post("/api/upload")
        .multipart(file_form("empty.txt", b""))
        .await
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY);

    app.server
        .post("/api/upload")
        .multipart(file_form("a.txt", b"a").add_text("expiresInHours", "0"))
        .await
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY);

    app.server
        .post("/api/upload")
        .multipart(file_form("a.txt", b"a").add_text("downloadLimit", "0"))
        .await
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY);

    let response = app
        .server
        .post("/api/upload")
        .multipart(file_form("a.txt", b"a").add_text("downloadLimit", "many"))
        .await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    let error: Value = response.json();
    assert_eq!(error["message"], "downloadLimit must be a whole number");
}

#[tokio::test]
async fn test_blank_optional_fields_are_ignored() {
    let app = create_test_app().await;
    let form = file_form("a.txt", b"a")
        .add_text("password", "")
        .add_text("expiresInHours", "")
        .add_text("downloadLimit", "");
    let body = upload(&app, form).await;
    let id = body["fileId"].as_str().unwrap();

    let meta: Value = app
        .server
        .get(&format!("/api/files/{id}/meta"))
        .await
        .json();
    assert_eq!(meta["hasPassword"], false);
}

#[tokio::test]
async fn test_upload_too_large() {
    let app = create_test_app().await;
    let content = vec![b'x'; 1024 * 1024 + 1];

    let response = app
        .server
        .post("/api/upload")
        .multipart(file_form("big.bin", &content))
        .await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    let error: Value = response.json();
    assert_eq!(error["message"], "file is too large (max 1MB)");
}

#[tokio::test]
async fn test_anonymous_upload_is_not_listed() {
    let app = create_test_app().await;

    app.server
        .post("/api/upload")
        .multipart(file_form("anon.txt", b"anon"))
        .await
        .assert_status_ok();

    let entries: Value = app
        .server
        .get("/api/files")
        .add_header("x-guest-id", GUEST)
        .await
        .json();
    assert!(entries.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_security_headers_and_health() {
    let app = create_test_app().await;

    let response = app.server.get("/health").await;
    response.assert_status_ok();
    assert_eq!(response.text(), "OK");

    let response = app.server.get("/api/files/x/meta").await;
    assert_eq!(
        response.header("x-content-type-options").to_str().unwrap(),
        "nosniff"
    );
}
