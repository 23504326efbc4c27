//! PeerHire API gateway.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌──────────────────────────────────────────────────┐
//!                     │                  ADMISSION PIPELINE              │
//!                     │                                                  │
//!   Client Request    │  ┌──────────┐  ┌──────────┐  ┌──────────────┐    │
//!   ──────────────────┼─▶│correlate │─▶│  origin  │─▶│ cache policy │    │
//!                     │  │(log, id) │  │(CORS)    │  │              │    │
//!                     │  └──────────┘  └──────────┘  └──────┬───────┘    │
//!                     │                                     ▼            │
//!                     │  ┌──────────┐  ┌──────────┐  ┌──────────────┐    │
//!   Client Response   │  │ handler  │◀─│role gate │◀─│  auth gate   │    │
//!   ◀─────────────────┼──│ | 404    │  │  (403)   │  │   (401)      │    │
//!                     │  └──────────┘  └──────────┘  └──────────────┘    │
//!                     │                                                  │
//!                     │  config · health · observability · lifecycle     │
//!                     └──────────────────────────────────────────────────┘
//! ```
//!
//! Configuration comes from the environment (`PORT`, `JWT_SECRET`,
//! `JWT_EXPIRATION`, `MONGODB_URI`, `FRONTEND_URL`, `DEMO_MODE`), optionally
//! layered over a TOML file named by `GATEWAY_CONFIG`.

use std::path::PathBuf;
use std::sync::Arc;

use peerhire_gateway::config::{load_config, loader::process_env, ObservabilityConfig};
use peerhire_gateway::lifecycle::{self, spawn_signal_listener, Shutdown};
use peerhire_gateway::observability::logging::init_tracing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let path = process_env("GATEWAY_CONFIG").map(PathBuf::from);
    let config = match load_config(path.as_deref(), process_env) {
        Ok(config) => config,
        Err(e) => {
            // No config means no log settings; fall back to defaults to report it.
            let _ = init_tracing(&ObservabilityConfig::default());
            tracing::error!(error = %e, "Invalid configuration, refusing to start");
            std::process::exit(1);
        }
    };

    init_tracing(&config.observability)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "peerhire-gateway starting");

    let started = lifecycle::start(config).await?;
    let local_addr = started.listener.local_addr()?;
    tracing::info!(address = %local_addr, "Listening for connections");

    let shutdown = Arc::new(Shutdown::new());
    let rx = shutdown.subscribe();
    tokio::spawn(started.storage_monitor.run(shutdown.subscribe()));
    spawn_signal_listener(shutdown);

    started.server.run(started.listener, rx).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
