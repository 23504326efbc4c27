//! Storage dependency tracking.
//!
//! The storage engine itself is an external collaborator. The gateway only
//! needs to know whether it is reachable: one connection attempt at startup,
//! then `StorageMonitor` re-dials in the background and `/healthz` reports
//! the latest result.
//!
//! `+srv` connection strings name a DNS seed list, not a dialable host. Those
//! are never TCP-checked and always report healthy.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::sync::broadcast;
use tokio::time;

use crate::config::StorageConfig;
use crate::lifecycle::wait_for_shutdown;
use crate::resilience::exponential_delay;

const DEFAULT_STORAGE_PORT: u16 = 27017;

/// A dependency `/healthz` consults.
pub trait DependencyCheck: Send + Sync {
    fn name(&self) -> &str;
    fn check(&self) -> Result<(), DependencyError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DependencyError {
    #[error("{0} is not connected")]
    Disconnected(String),
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage connection string is not a scheme://host[:port] URI")]
    InvalidUri,

    #[error("connect to {target} timed out after {timeout:?}")]
    Timeout { target: String, timeout: Duration },

    #[error("connect to {target} failed: {source}")]
    Connect {
        target: String,
        #[source]
        source: std::io::Error,
    },
}

/// Reachability of the storage backend.
#[derive(Debug)]
pub struct StorageConnection {
    target: String,
    dialable: bool,
    connected: AtomicBool,
}

impl StorageConnection {
    /// Derive the first `host:port` from a connection string such as
    /// `mongodb://user:pw@db1:27017,db2:27017/app?retryWrites=true`.
    pub fn from_uri(uri: &str) -> Result<Self, StorageError> {
        let (scheme, rest) = uri.trim().split_once("://").ok_or(StorageError::InvalidUri)?;
        let authority = rest.split(['/', '?']).next().unwrap_or_default();
        let hosts = authority.rsplit_once('@').map_or(authority, |(_, h)| h);
        let first = hosts.split(',').next().unwrap_or_default().trim();
        if first.is_empty() {
            return Err(StorageError::InvalidUri);
        }

        if scheme.ends_with("+srv") {
            return Ok(Self {
                target: first.to_string(),
                dialable: false,
                connected: AtomicBool::new(false),
            });
        }

        let target = match first.rsplit_once(':') {
            Some((host, port)) if !host.ends_with(']') && port.parse::<u16>().is_ok() => {
                first.to_string()
            }
            _ if first.ends_with(']') || !first.contains(':') => {
                format!("{}:{}", first, DEFAULT_STORAGE_PORT)
            }
            Some((_, port)) if first.starts_with('[') && port.parse::<u16>().is_ok() => {
                first.to_string()
            }
            _ => return Err(StorageError::InvalidUri),
        };

        Ok(Self {
            target,
            dialable: true,
            connected: AtomicBool::new(false),
        })
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    /// False for seed-list (`+srv`) targets, which are not TCP-checked.
    pub fn is_dialable(&self) -> bool {
        self.dialable
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    /// Single connection attempt with a deadline. Records the outcome.
    pub async fn connect(&self, timeout: Duration) -> Result<(), StorageError> {
        if !self.dialable {
            return Ok(());
        }
        let result = match time::timeout(timeout, TcpStream::connect(&self.target)).await {
            Ok(Ok(_stream)) => Ok(()),
            Ok(Err(source)) => Err(StorageError::Connect {
                target: self.target.clone(),
                source,
            }),
            Err(_) => Err(StorageError::Timeout {
                target: self.target.clone(),
                timeout,
            }),
        };
        self.connected.store(result.is_ok(), Ordering::Release);
        result
    }
}

impl DependencyCheck for StorageConnection {
    fn name(&self) -> &str {
        "storage"
    }

    fn check(&self) -> Result<(), DependencyError> {
        if !self.dialable || self.is_connected() {
            Ok(())
        } else {
            Err(DependencyError::Disconnected(self.target.clone()))
        }
    }
}

/// Re-dials storage until shutdown so `/healthz` tracks reconnects.
///
/// While storage is up it is re-checked every `interval`; while down, retries
/// back off exponentially from one second, capped at `interval`.
pub struct StorageMonitor {
    storage: Arc<StorageConnection>,
    connect_timeout: Duration,
    interval: Duration,
}

impl StorageMonitor {
    pub fn new(storage: Arc<StorageConnection>, connect_timeout: Duration, interval: Duration) -> Self {
        Self {
            storage,
            connect_timeout,
            interval,
        }
    }

    pub fn from_config(storage: Arc<StorageConnection>, config: &StorageConfig) -> Self {
        Self::new(
            storage,
            Duration::from_secs(config.connect_timeout_secs),
            Duration::from_secs(config.check_interval_secs),
        )
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        if !self.storage.is_dialable() {
            tracing::info!(host = self.storage.target(), "Storage seed list is not TCP-checked");
            return;
        }

        tracing::info!(
            address = self.storage.target(),
            interval = ?self.interval,
            "Storage monitor starting"
        );

        let mut failures = 0u32;
        loop {
            let was_connected = self.storage.is_connected();
            let delay = match self.storage.connect(self.connect_timeout).await {
                Ok(()) => {
                    if !was_connected {
                        tracing::info!(address = self.storage.target(), "Storage connected");
                    }
                    failures = 0;
                    self.interval
                }
                Err(e) => {
                    if was_connected {
                        tracing::error!(error = %e, "Storage connection lost");
                    } else {
                        tracing::debug!(error = %e, failures, "Storage still unreachable");
                    }
                    let delay = exponential_delay(failures, Duration::from_secs(1));
                    failures = failures.saturating_add(1);
                    delay.min(self.interval)
                }
            };

            tokio::select! {
                biased;
                _ = wait_for_shutdown(&mut shutdown) => {
                    tracing::info!("Storage monitor received shutdown signal, exiting loop");
                    break;
                }
                _ = time::sleep(delay) => {}
            }
        }
    }
}
