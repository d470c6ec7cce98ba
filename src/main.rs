//! Tours API server

use std::process;
use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use tours::config::ServerConfig;
use tours::core::service::TourService;
use tours::server::ServerBuilder;
use tours::storage::InMemoryTourService;

/// Open the configured store; the in-memory store when no database is set
async fn open_store(config: &ServerConfig) -> anyhow::Result<Arc<dyn TourService>> {
    let connection_string = config.connection_string()?;

    #[cfg(feature = "mongodb_backend")]
    {
        if let Some(uri) = connection_string {
            let service =
                tours::storage::MongoTourService::connect(&uri, &config.database_name).await?;
            return Ok(Arc::new(service));
        }
    }

    #[cfg(not(feature = "mongodb_backend"))]
    {
        if connection_string.is_some() {
            warn!("DATABASE is set but the mongodb_backend feature is disabled");
        }
    }

    warn!("No database configured, using the in-memory store");
    Ok(Arc::new(InMemoryTourService::new()))
}

#[tokio::main]
async fn main() {
    // Load configuration from .env and CLI arguments
    let config = ServerConfig::load().unwrap_or_else(|e| e.exit());

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    info!(env = %config.app_env, "Starting tours API");

    let store = match open_store(&config).await {
        Ok(store) => store,
        Err(e) => {
            error!("Failed to open the store: {e}");
            process::exit(1);
        }
    };

    let mut builder = ServerBuilder::new()
        .with_shared_tour_service(store.clone())
        .with_request_logging(config.is_development());
    if let Some(dir) = &config.public_dir {
        builder = builder.with_public_dir(dir.clone());
    }

    let served = builder.serve(&config.socket_addr()).await;

    if let Err(e) = store.close().await {
        error!("Failed to close the store: {e}");
    }

    if let Err(e) = served {
        error!("Server error: {e}");
        process::exit(1);
    }
}
