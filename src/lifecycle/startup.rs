//! Startup orchestration.
//!
//! Runs in dependency order: configuration summary, storage, metrics,
//! pipeline, listener. Anything that fails here is fatal; the caller exits
//! without serving traffic. The one exception is an unreachable storage
//! backend, which is logged, retried by the storage monitor, and surfaced
//! through `/healthz` instead.

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;

use crate::config::GatewayConfig;
use crate::health::{StorageConnection, StorageError, StorageMonitor};
use crate::http::{BuildError, HttpServer};
use crate::observability::{logging::mask, metrics};

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("pipeline: {0}")]
    Build(#[from] BuildError),

    #[error("storage: {0}")]
    Storage(#[from] StorageError),

    #[error("bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },
}

/// A built server and its bound listener, ready to `run`.
///
/// `storage_monitor` should be spawned alongside the server with a receiver
/// from the same `Shutdown`.
pub struct Started {
    pub server: HttpServer,
    pub listener: TcpListener,
    pub storage_monitor: StorageMonitor,
}

/// Log what the process is about to run with, secrets masked.
pub fn log_summary(config: &GatewayConfig) {
    tracing::info!(
        port = config.server.port,
        storage_uri = mask(config.storage.uri.as_deref()),
        jwt_secret = mask(config.auth.jwt_secret.as_deref()),
        jwt_expiration = ?config.auth.jwt_expiration,
        allowed_origins = ?config.cors.allowed_origins,
        demo_mode = config.auth.demo_mode,
        "Configuration loaded"
    );
}

/// Bring the gateway up from a validated configuration.
pub async fn start(config: GatewayConfig) -> Result<Started, StartupError> {
    log_summary(&config);

    let uri = config.storage.uri.as_deref().unwrap_or_default();
    let storage = Arc::new(StorageConnection::from_uri(uri)?);
    let connect_timeout = Duration::from_secs(config.storage.connect_timeout_secs);
    if storage.is_dialable() {
        match storage.connect(connect_timeout).await {
            Ok(()) => tracing::info!(address = storage.target(), "Storage connected"),
            Err(e) => tracing::error!(error = %e, "Storage connection error"),
        }
    }
    let storage_monitor = StorageMonitor::from_config(storage.clone(), &config.storage);

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics endpoint");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let address = config.server.bind_address();
    let server = HttpServer::builder(Arc::new(config))
        .dependency(storage.clone())
        .build()?;

    let listener = TcpListener::bind(&address)
        .await
        .map_err(|source| StartupError::Bind {
            address: address.clone(),
            source,
        })?;

    Ok(Started {
        server,
        listener,
        storage_monitor,
    })
}
