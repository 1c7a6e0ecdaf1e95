//! Blob retrieval through signed handles.

use axum::{
    body::Body,
    extract::{Path, State},
    http::header,
    response::Response,
};
use std::sync::Arc;

use crate::storage::BlobStore;
use crate::web::error::{ApiError, ErrorBody};
use crate::web::handlers::AppState;
use crate::FiledropError;

/// Generate a safe Content-Disposition header value for file downloads.
///
/// Control characters (CR and LF included) are dropped and quotes and
/// backslashes replaced in the plain `filename`; names that needed any of
/// that, or are not ASCII, also get an RFC 5987 `filename*`.
pub fn content_disposition_header(filename: &str) -> String {
    let needs_encoding =
        !filename.is_ascii() || filename.chars().any(|c| c.is_control() || c == '"' || c == '\\');

    if !needs_encoding {
        return format!("attachment; filename=\"{}\"", filename);
    }

    let sanitized: String = filename
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| match c {
            '"' | '\\' => '_',
            _ => c,
        })
        .collect();
    let encoded = urlencoding::encode(&sanitized);

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        sanitized, encoded
    )
}

/// GET /blobs/:token - Fetch file bytes with a retrieval handle.
///
/// Does not count a download; that happened when the handle was issued.
#[utoipa::path(
    get,
    path = "/blobs/{token}",
    tag = "files",
    params(("token" = String, Path, description = "Signed retrieval handle")),
    responses(
        (status = 200, description = "File content"),
        (status = 401, description = "Invalid or expired handle", body = ErrorBody),
        (status = 404, description = "File no longer stored", body = ErrorBody)
    )
)]
pub async fn serve_blob(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> Result<Response, ApiError> {
    let claims = state.signer.verify(&token, state.now()).map_err(|e| {
        tracing::debug!("Rejected retrieval handle: {}", e);
        ApiError::unauthorized("Invalid or expired download link")
    })?;

    let content = state
        .share
        .blobs()
        .get(&claims.key)
        .await
        .map_err(|e| match e {
            FiledropError::NotFound(_) => ApiError::file_not_found(),
            other => ApiError::from(other),
        })?;

    let content_type = mime_guess::from_path(&claims.name)
        .first_or_octet_stream()
        .to_string();

    Response::builder()
        .header(header::CONTENT_TYPE, content_type)
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition_header(&claims.name),
        )
        .header(header::CONTENT_LENGTH, content.len())
        .header(header::CACHE_CONTROL, "private, no-store")
        .body(Body::from(content))
        .map_err(|e| {
            tracing::error!("Failed to build response: {}", e);
            ApiError::internal("Failed to build response")
        })
}
