//! Readiness state machine.
//!
//! # States
//! - Checking: probing the backend; the UI shows a loading indicator
//! - Ready: a probe succeeded; render the application
//! - GivenUp: retries exhausted; render anyway (fail-open) and warn
//!
//! # State Transitions
//! ```text
//! Checking → Ready:   probe succeeds
//! Checking → Checking: probe fails, attempt+1 < max  (wait 2^(attempt+1) units)
//! Checking → GivenUp: probe fails, attempt+1 == max
//! Ready/GivenUp:      terminal until reset() starts a new session
//! ```
//!
//! Pure data: no clocks, no I/O. The driver in `handshake.rs` feeds it probe
//! results and honors the returned delays.

use std::time::Duration;

use crate::config::ReadinessConfig;
use crate::resilience::backoff::exponential_delay;

/// Probes allowed to fail before giving up.
pub const MAX_RETRIES: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadinessStatus {
    Checking,
    Ready,
    GivenUp,
}

impl ReadinessStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ReadinessStatus::Checking)
    }
}

/// Retry budget and delay unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub unit: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: MAX_RETRIES,
            unit: Duration::from_secs(1),
        }
    }
}

impl From<&ReadinessConfig> for RetryPolicy {
    fn from(config: &ReadinessConfig) -> Self {
        Self {
            max_retries: config.max_retries.max(1),
            unit: Duration::from_secs(config.base_delay_secs),
        }
    }
}

/// What the driver must do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Stop polling, render the application.
    Ready,
    /// Stay in Checking; probe again after the delay.
    RetryAfter(Duration),
    /// Stop polling, render anyway.
    GivenUp,
}

/// One session's readiness state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadinessState {
    attempt: u32,
    status: ReadinessStatus,
    last_error: Option<String>,
    policy: RetryPolicy,
}

impl ReadinessState {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            attempt: 0,
            status: ReadinessStatus::Checking,
            last_error: None,
            policy,
        }
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn status(&self) -> ReadinessStatus {
        self.status
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Whether the loading indicator should be shown.
    pub fn is_loading(&self) -> bool {
        self.status == ReadinessStatus::Checking
    }

    pub fn on_success(&mut self) -> Transition {
        match self.status {
            ReadinessStatus::Checking => {
                self.status = ReadinessStatus::Ready;
                Transition::Ready
            }
            status => Self::terminal(status),
        }
    }

    pub fn on_failure(&mut self, error: impl Into<String>) -> Transition {
        if self.status.is_terminal() {
            return Self::terminal(self.status);
        }
        self.last_error = Some(error.into());
        let previous = self.attempt;
        self.attempt = (previous + 1).min(self.policy.max_retries);

        if self.attempt >= self.policy.max_retries {
            self.status = ReadinessStatus::GivenUp;
            Transition::GivenUp
        } else {
            Transition::RetryAfter(exponential_delay(previous + 1, self.policy.unit))
        }
    }

    /// Start over for a new session.
    pub fn reset(&mut self) {
        *self = Self::new(self.policy);
    }

    fn terminal(status: ReadinessStatus) -> Transition {
        match status {
            ReadinessStatus::GivenUp => Transition::GivenUp,
            _ => Transition::Ready,
        }
    }
}

impl Default for ReadinessState {
    fn default() -> Self {
        Self::new(RetryPolicy::default())
    }
}
