//! Per-client rate limiting.

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use std::{
    collections::HashMap,
    net::SocketAddr,
    num::NonZeroU32,
    sync::{Arc, RwLock},
    time::Duration,
};

use crate::web::error::ApiError;

/// Rate limiter for a single client.
pub type ClientRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Limiters keyed by client IP, all sharing one quota.
struct LimiterSet {
    limiters: RwLock<HashMap<String, Arc<ClientRateLimiter>>>,
    quota: Quota,
}

impl LimiterSet {
    fn new(requests_per_minute: u32) -> Self {
        Self {
            limiters: RwLock::new(HashMap::new()),
            quota: Quota::per_minute(
                NonZeroU32::new(requests_per_minute).unwrap_or(NonZeroU32::MIN),
            ),
        }
    }

    fn limiter_for(&self, ip: &str) -> Arc<ClientRateLimiter> {
        if let Some(limiter) = self
            .limiters
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(ip)
        {
            return limiter.clone();
        }

        let mut guard = self.limiters.write().unwrap_or_else(|e| e.into_inner());
        guard
            .entry(ip.to_string())
            .or_insert_with(|| Arc::new(RateLimiter::direct(self.quota)))
            .clone()
    }

    fn check(&self, ip: &str) -> bool {
        self.limiter_for(ip).check().is_ok()
    }

    fn len(&self) -> usize {
        self.limiters.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn forget_idle(&self) {
        self.limiters
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .retain(|_, v| Arc::strong_count(v) > 1);
    }
}

/// State for rate limiting.
#[derive(Clone)]
pub struct RateLimitState {
    login: Arc<LimiterSet>,
    api: Arc<LimiterSet>,
}

impl RateLimitState {
    /// Create limits in requests per minute per client.
    pub fn new(login_rate_limit: u32, api_rate_limit: u32) -> Self {
        Self {
            login: Arc::new(LimiterSet::new(login_rate_limit)),
            api: Arc::new(LimiterSet::new(api_rate_limit)),
        }
    }

    /// Check if a request is allowed for the login endpoints.
    pub fn check_login(&self, ip: &str) -> bool {
        self.login.check(ip)
    }

    /// Check if a request is allowed for the general API.
    pub fn check_api(&self, ip: &str) -> bool {
        self.api.check(ip)
    }

    /// Number of clients currently tracked.
    pub fn tracked_clients(&self) -> usize {
        self.login.len() + self.api.len()
    }

    /// Drop limiters nobody holds a reference to.
    pub fn cleanup(&self) {
        self.login.forget_idle();
        self.api.forget_idle();
    }

    /// Start a background task to periodically clean up old entries.
    pub fn start_cleanup_task(self: Arc<Self>) {
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(Duration::from_secs(300)).await;
                self.cleanup();
            }
        });
    }
}

/// Extract client IP from request.
fn client_ip(req: &Request<Body>) -> String {
    // First hop of X-Forwarded-For when behind a reverse proxy
    if let Some(ip) = req
        .headers()
        .get("X-Forwarded-For")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
    {
        return ip.trim().to_string();
    }

    if let Some(real_ip) = req
        .headers()
        .get("X-Real-IP")
        .and_then(|v| v.to_str().ok())
    {
        return real_ip.trim().to_string();
    }

    if let Some(ConnectInfo(addr)) = req.extensions().get::<ConnectInfo<SocketAddr>>() {
        return addr.ip().to_string();
    }

    "unknown".to_string()
}

/// Rate limiting middleware for the login and registration endpoints.
pub async fn login_rate_limit(
    state: Arc<RateLimitState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let ip = client_ip(&req);

    if !state.check_login(&ip) {
        tracing::warn!(ip = %ip, "Login rate limit exceeded");
        return ApiError::too_many_requests("Too many login attempts. Please try again later.")
            .into_response();
    }

    next.run(req).await
}

/// Rate limiting middleware for the general API.
pub async fn api_rate_limit(
    state: Arc<RateLimitState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let ip = client_ip(&req);

    if !state.check_api(&ip) {
        tracing::warn!(ip = %ip, "API rate limit exceeded");
        return ApiError::too_many_requests("Too many requests. Please try again later.")
            .into_response();
    }

    next.run(req).await
}
