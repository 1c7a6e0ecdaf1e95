//! Router configuration for the HTTP surface.

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use super::handlers::{
    delete_file, download, file_meta, health_check, list_files, login, logout, me,
    redirect_short_link, refresh, register, serve_blob, upload, AppState,
};
use super::middleware::{
    api_rate_limit, create_cors_layer, identity_layer, login_rate_limit, security_headers,
    RateLimitState,
};

/// Room for multipart framing and the small text fields next to the file.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Create the main router: `/api`, short links and blob retrieval.
pub fn create_router(
    app_state: Arc<AppState>,
    rate_limits: Arc<RateLimitState>,
    cors_origins: &[String],
) -> Router {
    let max_upload = app_state.share.settings().max_upload_size as usize;

    // Credential endpoints get the stricter limit
    let login_limits = rate_limits.clone();
    let auth_credential_routes = Router::new()
        .route("/login", post(login))
        .route("/register", post(register))
        .layer(middleware::from_fn(move |req, next| {
            login_rate_limit(login_limits.clone(), req, next)
        }));

    let auth_routes = Router::new()
        .route("/logout", post(logout))
        .route("/refresh", post(refresh))
        .route("/me", get(me))
        .merge(auth_credential_routes);

    let upload_routes = Router::new()
        .route("/upload", post(upload))
        .layer(DefaultBodyLimit::max(max_upload + MULTIPART_OVERHEAD_BYTES));

    let api_limits = rate_limits.clone();
    let api_routes = Router::new()
        .route("/files", get(list_files))
        .route("/files/:id", delete(delete_file))
        .route("/files/:id/meta", get(file_meta))
        .route("/files/:id/download", post(download))
        .merge(upload_routes)
        .nest("/auth", auth_routes)
        .layer(middleware::from_fn(move |req, next| {
            api_rate_limit(api_limits.clone(), req, next)
        }));

    let resolver = app_state.resolver.clone();

    Router::new()
        .nest("/api", api_routes)
        .route("/s/:short_id", get(redirect_short_link))
        .route("/blobs/:token", get(serve_blob))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer(cors_origins))
                .layer(middleware::from_fn(security_headers))
                .layer(middleware::from_fn(move |req, next| {
                    identity_layer(resolver.clone(), req, next)
                })),
        )
        .with_state(app_state)
}

/// Create a health check router.
pub fn create_health_router() -> Router {
    Router::new().route("/health", get(health_check))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, http::StatusCode};
    use tower::util::ServiceExt;

    #[tokio::test]
    async fn test_health_router() {
        let response = create_health_router()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
