//! Liveness probe.

/// GET /health - Liveness probe.
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses((status = 200, description = "Server is up", body = String))
)]
pub async fn health_check() -> &'static str {
    "OK"
}
