//! Resilience helpers.
//!
//! # Data Flow
//! ```text
//! Outbound probe:
//!     → timeouts.rs (every probe has a deadline)
//!     → On failure: backoff.rs (exponential delay before the next attempt)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; a slow network must not look like a long wait
//! - Delays are deterministic so the schedule can be asserted in tests

pub mod backoff;
pub mod timeouts;

pub use backoff::exponential_delay;
pub use timeouts::{with_deadline, DeadlineExceeded};
