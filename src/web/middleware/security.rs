//! Security headers middleware.

use axum::{
    body::Body,
    http::{header, header::HeaderValue, Request},
    middleware::Next,
    response::Response,
};

const FIXED_HEADERS: &[(&str, &str)] = &[
    ("X-Content-Type-Options", "nosniff"),
    ("X-Frame-Options", "DENY"),
    ("Referrer-Policy", "no-referrer"),
    // Deprecated; modern browsers rely on CSP instead
    ("X-XSS-Protection", "0"),
];

/// Security headers middleware.
///
/// Adds nosniff, frame and referrer headers to every response, and
/// `Cache-Control: no-store` unless the handler chose its own policy.
/// `Referrer-Policy: no-referrer` keeps share links and signed blob URLs
/// out of third-party logs.
///
/// Strict-Transport-Security belongs at the reverse proxy.
pub async fn security_headers(req: Request<Body>, next: Next) -> Response {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();

    for (name, value) in FIXED_HEADERS {
        headers.insert(*name, HeaderValue::from_static(*value));
    }

    if !headers.contains_key(header::CACHE_CONTROL) {
        headers.insert(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store, max-age=0"),
        );
    }

    response
}
