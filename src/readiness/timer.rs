//! Timer abstraction for the handshake.
//!
//! Dropping the returned future cancels the pending timer, which is how the
//! driver clears it on session teardown.

use std::future::Future;
use std::time::Duration;

pub trait Timer: Send + Sync {
    fn sleep(&self, delay: Duration) -> impl Future<Output = ()> + Send;
}

/// Tokio-backed timer. Honors `tokio::time::pause` in tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioTimer;

impl Timer for TokioTimer {
    fn sleep(&self, delay: Duration) -> impl Future<Output = ()> + Send {
        tokio::time::sleep(delay)
    }
}
