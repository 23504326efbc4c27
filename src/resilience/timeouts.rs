//! Deadline enforcement for outbound calls.

use std::future::Future;
use std::time::Duration;

use tokio::time;

/// The wrapped call did not finish in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("deadline of {0:?} exceeded")]
pub struct DeadlineExceeded(pub Duration);

/// Run `fut` with a deadline. The future is dropped when it expires.
pub async fn with_deadline<F: Future>(
    deadline: Duration,
    fut: F,
) -> Result<F::Output, DeadlineExceeded> {
    time::timeout(deadline, fut)
        .await
        .map_err(|_| DeadlineExceeded(deadline))
}
