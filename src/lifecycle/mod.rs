//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Validate (fatal on error) → Connect storage
//!     → Build pipeline → Bind listener
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Drain connections → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Fail fast: configuration errors stop the process before it binds
//! - Listener binds last (traffic only when the pipeline is built)

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::{wait_for_shutdown, Shutdown};
pub use signals::{spawn_signal_listener, termination_signal};
pub use startup::{start, Started, StartupError};
