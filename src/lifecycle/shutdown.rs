//! Shutdown coordination.

use std::future;

use tokio::sync::broadcast::{self, error::RecvError};

/// Coordinator for graceful shutdown.
///
/// Provides a broadcast channel that all long-running tasks can subscribe to:
/// the HTTP server drains on it, the readiness handshake abandons its pending
/// timer on it.
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Trigger the shutdown signal.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }

    /// Number of tasks still listening.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolve once shutdown is triggered.
///
/// A dropped coordinator can never fire, so a closed channel waits forever
/// rather than being mistaken for a shutdown.
pub async fn wait_for_shutdown(rx: &mut broadcast::Receiver<()>) {
    match rx.recv().await {
        Ok(()) | Err(RecvError::Lagged(_)) => {}
        Err(RecvError::Closed) => future::pending::<()>().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_trigger_reaches_subscribers() {
        let shutdown = Shutdown::new();
        let mut a = shutdown.subscribe();
        let mut b = shutdown.subscribe();
        assert_eq!(shutdown.receiver_count(), 2);

        shutdown.trigger();
        wait_for_shutdown(&mut a).await;
        wait_for_shutdown(&mut b).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_closed_channel_never_fires() {
        let mut rx = Shutdown::new().subscribe();
        let waited = tokio::time::timeout(Duration::from_secs(60), wait_for_shutdown(&mut rx)).await;
        assert!(waited.is_err());
    }
}
