//! Client readiness handshake.
//!
//! # Data Flow
//! ```text
//! Session start:
//!     ReadinessGate::ensure (once per session)
//!     → disabled build → Skipped
//!     → handshake.rs: probe.rs (GET <base>/spinup, deadline)
//!         → state.rs (Checking → Ready | Checking | GivenUp)
//!         → timer.rs (2s, 4s, 8s, 16s between probes)
//!     → verdict cached; the UI renders on Ready, GivenUp or Skipped
//!
//! Session teardown:
//!     shutdown broadcast → pending timer dropped, no further probes
//! ```

pub mod handshake;
pub mod probe;
pub mod state;
pub mod timer;

pub use handshake::{HandshakeOutcome, ReadinessGate, ReadinessHandshake};
pub use probe::{HttpProbe, Probe, ProbeError};
pub use state::{ReadinessState, ReadinessStatus, RetryPolicy, Transition, MAX_RETRIES};
pub use timer::{Timer, TokioTimer};
