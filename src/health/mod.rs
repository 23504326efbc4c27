//! Health subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     MONGODB_URI → storage.rs (StorageConnection::connect)
//!
//! Background (until shutdown):
//!     StorageMonitor → re-dial every check_interval_secs while up,
//!                      backoff (1s, 2s, 4s, … capped) while down
//!
//! GET /healthz:
//!     → every registered DependencyCheck
//!     → all Ok  → 200 {status: "ok", timestamp}
//!     → any Err → 500 {status: "error", error} (detail logged only)
//!
//! GET /spinup:
//!     → 200 {status: "ok"}, no dependency checks at all
//! ```

pub mod storage;

pub use storage::{
    DependencyCheck, DependencyError, StorageConnection, StorageError, StorageMonitor,
};
