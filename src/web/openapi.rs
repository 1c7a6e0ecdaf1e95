//! OpenAPI document and Swagger UI.

use axum::Router;
use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use super::dto::{
    DownloadRequest, DownloadResponse, FileEntryResponse, FileMetaResponse, LoginRequest,
    LoginResponse, LogoutRequest, MeResponse, RefreshRequest, RefreshResponse, RegisterRequest,
    SuccessResponse, UploadResponse, UserInfo,
};
use super::error::{ErrorBody, ErrorCode};
use super::handlers;

/// Path of the generated OpenAPI JSON.
pub const OPENAPI_JSON_PATH: &str = "/api-docs/openapi.json";

/// OpenAPI document of the HTTP API.
#[derive(OpenApi)]
#[openapi(
    info(title = "filedrop", description = "Expiring, optionally password-protected file sharing links"),
    paths(
        handlers::share::upload,
        handlers::share::file_meta,
        handlers::share::download,
        handlers::share::list_files,
        handlers::share::delete_file,
        handlers::share::redirect_short_link,
        handlers::blob::serve_blob,
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::refresh,
        handlers::auth::logout,
        handlers::auth::me,
        handlers::health::health_check,
    ),
    components(schemas(
        UploadResponse,
        FileMetaResponse,
        DownloadRequest,
        DownloadResponse,
        FileEntryResponse,
        SuccessResponse,
        RegisterRequest,
        LoginRequest,
        LogoutRequest,
        RefreshRequest,
        LoginResponse,
        RefreshResponse,
        UserInfo,
        MeResponse,
        ErrorBody,
        ErrorCode,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "files", description = "Upload, metadata, download and owner listing"),
        (name = "links", description = "Short link redirects"),
        (name = "auth", description = "Accounts and sessions"),
        (name = "health", description = "Liveness")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
            components.add_security_scheme(
                "guest_id",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("X-Guest-Id"))),
            );
        }
    }
}

/// Router serving Swagger UI at `/swagger-ui` and the JSON document.
pub fn create_swagger_router() -> Router {
    Router::new().merge(SwaggerUi::new("/swagger-ui").url(OPENAPI_JSON_PATH, ApiDoc::openapi()))
}
