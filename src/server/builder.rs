//! ServerBuilder for fluent API to build HTTP servers

use super::handlers::ApiState;
use super::router::{build_api_routes, health_routes};
use crate::core::service::TourService;
use anyhow::{Result, anyhow};
use axum::Router;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Builder for the tours HTTP server
///
/// # Example
///
/// ```ignore
/// let app = ServerBuilder::new()
///     .with_tour_service(InMemoryTourService::new())
///     .with_request_logging(true)
///     .build()?;
/// ```
pub struct ServerBuilder {
    tour_service: Option<Arc<dyn TourService>>,
    public_dir: Option<PathBuf>,
    request_logging: bool,
}

impl ServerBuilder {
    /// Create a new ServerBuilder
    pub fn new() -> Self {
        Self {
            tour_service: None,
            public_dir: None,
            request_logging: false,
        }
    }

    /// Set the tour service (required)
    pub fn with_tour_service(mut self, service: impl TourService + 'static) -> Self {
        self.tour_service = Some(Arc::new(service));
        self
    }

    /// Set a tour service that is also held elsewhere, e.g. to close it after shutdown
    pub fn with_shared_tour_service(mut self, service: Arc<dyn TourService>) -> Self {
        self.tour_service = Some(service);
        self
    }

    /// Serve static files from this directory for unmatched paths
    pub fn with_public_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.public_dir = Some(dir.into());
        self
    }

    /// Log every request and response
    pub fn with_request_logging(mut self, enabled: bool) -> Self {
        self.request_logging = enabled;
        self
    }

    /// Build the final router
    pub fn build(self) -> Result<Router> {
        let tour_service = self
            .tour_service
            .ok_or_else(|| anyhow!("TourService is required. Call .with_tour_service() first."))?;

        let state = ApiState {
            tours: tour_service,
        };

        let mut app = health_routes().merge(build_api_routes(state));

        if let Some(dir) = self.public_dir {
            tracing::debug!(dir = %dir.display(), "serving static files");
            app = app.fallback_service(ServeDir::new(dir));
        }

        if self.request_logging {
            app = app.layer(TraceLayer::new_for_http());
        }

        Ok(app)
    }

    /// Serve the application with graceful shutdown
    ///
    /// # Example
    ///
    /// ```ignore
    /// ServerBuilder::new()
    ///     .with_tour_service(service)
    ///     .serve("127.0.0.1:3000").await?;
    /// ```
    pub async fn serve(self, addr: &str) -> Result<()> {
        let app = self.build()?;
        let listener = TcpListener::bind(addr).await?;

        tracing::info!("Server listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolve on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {}", e);
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
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal, initiating graceful shutdown...");
        },
    }
}
