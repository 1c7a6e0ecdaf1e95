//! Web server for filedrop.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::compression::CompressionLayer;

use crate::config::{Config, WebConfig};
use crate::share::Sweeper;
use crate::{FiledropError, Result};

use super::handlers::AppState;
use super::middleware::RateLimitState;
use super::openapi::create_swagger_router;
use super::router::{create_health_router, create_router};

/// Web server for the API.
pub struct WebServer {
    /// Server address.
    addr: SocketAddr,
    /// Application state.
    app_state: Arc<AppState>,
    /// Per-client rate limits.
    rate_limits: Arc<RateLimitState>,
    /// Web configuration.
    web_config: WebConfig,
    /// Interval of the retention sweep.
    sweep_interval: Duration,
}

impl WebServer {
    /// Create a new web server.
    pub fn new(config: &Config, app_state: AppState) -> Result<Self> {
        let addr = format!("{}:{}", config.server.host, config.server.port)
            .parse()
            .map_err(|e| FiledropError::Config(format!("invalid server address: {e}")))?;

        Ok(Self {
            addr,
            app_state: Arc::new(app_state),
            rate_limits: Arc::new(RateLimitState::new(
                config.web.login_rate_limit,
                config.web.api_rate_limit,
            )),
            web_config: config.web.clone(),
            sweep_interval: Duration::from_secs(config.retention.sweep_interval_secs),
        })
    }

    /// Get the server address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// The complete application router.
    pub fn router(&self) -> Router {
        create_router(
            self.app_state.clone(),
            self.rate_limits.clone(),
            &self.web_config.cors_origins,
        )
        .merge(create_health_router())
        .merge(create_swagger_router())
        .layer(CompressionLayer::new())
    }

    fn start_background_tasks(&self) {
        Sweeper::new(
            self.app_state.share.clone(),
            self.app_state.db.clone(),
            self.sweep_interval,
        )
        .start();
        tracing::info!(
            interval_secs = self.sweep_interval.as_secs(),
            "Retention sweep started"
        );

        self.rate_limits.clone().start_cleanup_task();
    }

    async fn bind(&self) -> Result<(TcpListener, SocketAddr)> {
        let listener = TcpListener::bind(self.addr).await?;
        let local_addr = listener.local_addr()?;
        Ok((listener, local_addr))
    }

    /// Run the web server until it fails.
    pub async fn run(self) -> Result<()> {
        let router = self.router();
        let (listener, local_addr) = self.bind().await?;

        // Background tasks only start once the port is ours
        self.start_background_tasks();
        tracing::info!("Web server listening on http://{}", local_addr);

        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await?;
        Ok(())
    }

    /// Run the server and return the actual bound address.
    ///
    /// This is useful for testing when binding to port 0.
    pub async fn run_with_addr(self) -> Result<SocketAddr> {
        let router = self.router();
        let (listener, local_addr) = self.bind().await?;

        self.start_background_tasks();
        tracing::info!("Web server listening on http://{}", local_addr);

        tokio::spawn(async move {
            if let Err(e) = axum::serve(
                listener,
                router.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            {
                tracing::error!("Web server error: {}", e);
            }
        });

        Ok(local_addr)
    }
}
