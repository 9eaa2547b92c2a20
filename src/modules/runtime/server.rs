//! HTTP server for Infraroute

use axum::{
    routing::{get, post},
    Router,
};
use infraroute_core::{Config, InfrarouteError};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use crate::handlers::{QueryHandler, SourcesHandler};
use crate::router::IntelligentRouter;
use crate::state::AppState;

const REQUEST_TIMEOUT_MARGIN: Duration = Duration::from_secs(5);

/// Runtime server for Infraroute
pub struct Runtime {
    router: Arc<IntelligentRouter>,
    port: u16,
    request_timeout: Duration,
}

impl Runtime {
    /// Create a new runtime from a configuration
    pub async fn new(config: &Config) -> Result<Self, InfrarouteError> {
        Self::with_port_override(config, None).await
    }

    /// Create a new runtime with an optional port override
    pub async fn with_port_override(
        config: &Config,
        port_override: Option<u16>,
    ) -> Result<Self, InfrarouteError> {
        let router = Arc::new(IntelligentRouter::from_config(config).await?);
        Ok(Self::from_router(
            router,
            port_override.unwrap_or_else(|| config.port()),
        ))
    }

    pub fn from_router(router: Arc<IntelligentRouter>, port: u16) -> Self {
        // Leave the router room to answer a failed source with the fallback
        let request_timeout = router.request_budget().saturating_add(REQUEST_TIMEOUT_MARGIN);
        Self {
            router,
            port,
            request_timeout,
        }
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn router(&self) -> &Arc<IntelligentRouter> {
        &self.router
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Build the Axum router
    fn build_router(&self) -> Router {
        let state = AppState::new(self.router.clone());

        // CORS configuration
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        Router::new()
            .route("/query", post(QueryHandler::execute))
            .route("/plan", post(QueryHandler::plan))
            .route("/sources", get(SourcesHandler::list))
            .route("/discover", post(SourcesHandler::discover))
            .route("/health", get(Self::health_check))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(TraceLayer::new_for_http())
                    .layer(TimeoutLayer::new(self.request_timeout))
                    .layer(cors),
            )
    }

    /// Health check endpoint
    async fn health_check() -> &'static str {
        "OK"
    }

    /// Start the server
    pub async fn run(&self) -> Result<(), InfrarouteError> {
        let addr: SocketAddr = format!("0.0.0.0:{}", self.port)
            .parse()
            .map_err(|e| InfrarouteError::Server(format!("Invalid address: {}", e)))?;

        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| InfrarouteError::Server(format!("Failed to bind: {}", e)))?;

        info!("Starting Infraroute server on http://{}", addr);
        info!("Environment: {}", self.router.registry().environment());
        info!("Registered sources: {}", self.router.registry().len().await);

        self.serve(listener, Self::shutdown_signal()).await
    }

    /// Serve on an already bound listener until `shutdown` resolves
    pub async fn serve<F>(&self, listener: TcpListener, shutdown: F) -> Result<(), InfrarouteError>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        axum::serve(listener, self.build_router())
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| InfrarouteError::Server(format!("Server error: {}", e)))?;

        info!("Server stopped");
        Ok(())
    }

    /// Wait for shutdown signal
    async fn shutdown_signal() {
        let ctrl_c = async {
            if let Err(e) = signal::ctrl_c().await {
                warn!("Failed to install CTRL+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                Ok(mut stream) => {
                    stream.recv().await;
                }
                Err(e) => {
                    warn!("Failed to install SIGTERM handler: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {
                debug!("Received CTRL+C, shutting down...");
            }
            _ = terminate => {
                debug!("Received SIGTERM, shutting down...");
            }
        }
    }
}
