//! Share handlers: upload, metadata, download, short links and owner listing.

use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use crate::share::UploadRequest;
use crate::web::dto::{
    DownloadRequest, DownloadResponse, FileEntryResponse, FileMetaResponse,
    OptionalValidatedJson, SuccessResponse, UploadResponse,
};
use crate::web::error::{ApiError, ErrorBody};
use crate::web::handlers::AppState;
use crate::web::middleware::{CurrentIdentity, RequireIdentity};

/// Multipart form of an upload, before validation.
#[derive(Debug, Default)]
struct UploadForm {
    file_name: Option<String>,
    content: Option<Vec<u8>>,
    password: Option<String>,
    expires_in_hours: Option<i64>,
    download_limit: Option<i64>,
}

impl UploadForm {
    fn into_request(self) -> Result<UploadRequest, ApiError> {
        let content = self
            .content
            .ok_or_else(|| ApiError::bad_request("No file provided"))?;
        let file_name = self
            .file_name
            .filter(|n| !n.trim().is_empty())
            .ok_or_else(|| ApiError::bad_request("No file name provided"))?;

        Ok(UploadRequest {
            file_name,
            content,
            password: self.password,
            expires_in_hours: self.expires_in_hours,
            download_limit: self.download_limit,
        })
    }
}

/// Parse an optional integer form field. Blank means absent.
fn parse_optional_int(field: &str, value: &str) -> Result<Option<i64>, ApiError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse::<i64>()
        .map(Some)
        .map_err(|_| ApiError::unprocessable(format!("{field} must be a whole number")))
}

fn multipart_error(e: axum::extract::multipart::MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return ApiError::payload_too_large("File too large");
    }
    tracing::debug!("Failed to read multipart field: {}", e);
    ApiError::bad_request("Invalid multipart data")
}

async fn read_upload_form(mut multipart: Multipart) -> Result<UploadForm, ApiError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "file" => {
                form.file_name = field.file_name().map(|s| s.to_string());
                form.content = Some(field.bytes().await.map_err(multipart_error)?.to_vec());
            }
            "password" => {
                let value = field.text().await.map_err(multipart_error)?;
                form.password = Some(value).filter(|p| !p.is_empty());
            }
            "expiresInHours" => {
                let value = field.text().await.map_err(multipart_error)?;
                form.expires_in_hours = parse_optional_int("expiresInHours", &value)?;
            }
            "downloadLimit" => {
                let value = field.text().await.map_err(multipart_error)?;
                form.download_limit = parse_optional_int("downloadLimit", &value)?;
            }
            _ => {}
        }
    }

    Ok(form)
}

/// POST /api/upload - Upload a file and get its short link.
///
/// Request body: multipart/form-data with a "file" field and optional
/// "password", "expiresInHours" and "downloadLimit" fields.
#[utoipa::path(
    post,
    path = "/api/upload",
    tag = "files",
    request_body(content_type = "multipart/form-data", description = "file, password?, expiresInHours?, downloadLimit?"),
    responses(
        (status = 200, description = "File stored", body = UploadResponse),
        (status = 400, description = "Missing file or malformed form", body = ErrorBody),
        (status = 413, description = "File too large", body = ErrorBody),
        (status = 422, description = "Invalid upload options", body = ErrorBody)
    )
)]
pub async fn upload(
    State(state): State<Arc<AppState>>,
    CurrentIdentity(identity): CurrentIdentity,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let request = read_upload_form(multipart).await?.into_request()?;
    let outcome = state.share.upload(request, identity.as_ref()).await?;
    Ok(Json(UploadResponse::new(&outcome)))
}

/// GET /api/files/:id/meta - Public metadata of a file.
#[utoipa::path(
    get,
    path = "/api/files/{id}/meta",
    tag = "files",
    params(("id" = String, Path, description = "File ID")),
    responses(
        (status = 200, description = "File metadata", body = FileMetaResponse),
        (status = 400, description = "Link expired or malformed body", body = ErrorBody),
        (status = 404, description = "File not found", body = ErrorBody)
    )
)]
pub async fn file_meta(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<FileMetaResponse>, ApiError> {
    let meta = state.share.metadata(&id).await?;
    Ok(Json(meta.into()))
}

/// POST /api/files/:id/download - Request a download URL.
///
/// The body is optional; `{ "password": "..." }` for protected files.
#[utoipa::path(
    post,
    path = "/api/files/{id}/download",
    tag = "files",
    params(("id" = String, Path, description = "File ID")),
    request_body(content = DownloadRequest, description = "Password, if the file has one"),
    responses(
        (status = 200, description = "Short-lived download URL", body = DownloadResponse),
        (status = 400, description = "Link expired or malformed body", body = ErrorBody),
        (status = 401, description = "Incorrect password", body = ErrorBody),
        (status = 404, description = "File not found", body = ErrorBody)
    )
)]
pub async fn download(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    OptionalValidatedJson(req): OptionalValidatedJson<DownloadRequest>,
) -> Result<Json<DownloadResponse>, ApiError> {
    let handle = state.share.download(&id, req.password.as_deref()).await?;
    Ok(Json(handle.into()))
}

/// GET /s/:short_id - Redirect a short link to the file's page.
#[utoipa::path(
    get,
    path = "/s/{short_id}",
    tag = "links",
    params(("short_id" = String, Path, description = "Short link ID")),
    responses(
        (status = 302, description = "Redirect to the file page"),
        (status = 404, description = "Unknown or expired link", body = ErrorBody)
    )
)]
pub async fn redirect_short_link(
    State(state): State<Arc<AppState>>,
    Path(short_id): Path<String>,
) -> Result<Response, ApiError> {
    let target = state.share.resolve_short_link(&short_id).await?;
    Ok((StatusCode::FOUND, [(header::LOCATION, target)]).into_response())
}

/// GET /api/files - Files uploaded by the caller, newest first.
#[utoipa::path(
    get,
    path = "/api/files",
    tag = "files",
    responses(
        (status = 200, description = "Caller's uploads", body = Vec<FileEntryResponse>),
        (status = 401, description = "No identity", body = ErrorBody)
    ),
    security(("bearer_auth" = []), ("guest_id" = []))
)]
pub async fn list_files(
    State(state): State<Arc<AppState>>,
    RequireIdentity(identity): RequireIdentity,
) -> Result<Json<Vec<FileEntryResponse>>, ApiError> {
    let now = state.now();
    let entries = state
        .share
        .list(&identity)
        .await?
        .iter()
        .map(|record| {
            FileEntryResponse::new(record, state.share.metadata_page_url(&record.id), now)
        })
        .collect();
    Ok(Json(entries))
}

/// DELETE /api/files/:id - Delete one of the caller's files.
#[utoipa::path(
    delete,
    path = "/api/files/{id}",
    tag = "files",
    params(("id" = String, Path, description = "File ID")),
    responses(
        (status = 200, description = "File deleted", body = SuccessResponse),
        (status = 401, description = "No identity", body = ErrorBody),
        (status = 404, description = "File not found", body = ErrorBody)
    ),
    security(("bearer_auth" = []), ("guest_id" = []))
)]
pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    RequireIdentity(identity): RequireIdentity,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, ApiError> {
    state.share.delete(&id, &identity).await?;
    Ok(Json(SuccessResponse::ok()))
}
