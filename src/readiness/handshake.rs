//! Handshake driver and per-session gate.
//!
//! Drives `ReadinessState` with real probes and a timer. Exactly one probe is
//! in flight at a time; the next is scheduled only after the previous one
//! resolved. A shutdown signal abandons the pending probe or timer.

use std::time::Duration;

use tokio::sync::{broadcast, OnceCell};

use crate::config::ReadinessConfig;
use crate::lifecycle::wait_for_shutdown;
use crate::readiness::probe::{HttpProbe, Probe, ProbeError};
use crate::readiness::state::{ReadinessState, RetryPolicy, Transition};
use crate::readiness::timer::{Timer, TokioTimer};
use crate::resilience::with_deadline;

/// How a session's handshake ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandshakeOutcome {
    /// A probe succeeded.
    Ready { probes: u32 },
    /// Retries exhausted; the application renders anyway.
    GivenUp {
        probes: u32,
        last_error: Option<String>,
    },
    /// Handshake disabled for this build.
    Skipped,
    /// Session ended before a verdict.
    Cancelled { probes: u32 },
}

impl HandshakeOutcome {
    /// Whether the application should render. Fail-open: only a torn-down
    /// session does not.
    pub fn should_render(&self) -> bool {
        !matches!(self, HandshakeOutcome::Cancelled { .. })
    }
}

pub struct ReadinessHandshake<P, T> {
    probe: P,
    timer: T,
    policy: RetryPolicy,
    probe_timeout: Duration,
}

impl<P: Probe, T: Timer> ReadinessHandshake<P, T> {
    pub fn new(probe: P, timer: T, policy: RetryPolicy, probe_timeout: Duration) -> Self {
        Self {
            probe,
            timer,
            policy,
            probe_timeout,
        }
    }

    pub fn from_config(probe: P, timer: T, config: &ReadinessConfig) -> Self {
        Self::new(
            probe,
            timer,
            RetryPolicy::from(config),
            Duration::from_secs(config.probe_timeout_secs),
        )
    }

    pub fn probe(&self) -> &P {
        &self.probe
    }

    /// Run one session's handshake to a verdict.
    pub async fn run(&self, shutdown: &mut broadcast::Receiver<()>) -> HandshakeOutcome {
        let mut state = ReadinessState::new(self.policy);
        let mut probes = 0;

        loop {
            probes += 1;
            let result = tokio::select! {
                biased;
                _ = wait_for_shutdown(shutdown) => {
                    tracing::info!(probes, "Session ended during readiness probe");
                    return HandshakeOutcome::Cancelled { probes };
                }
                result = with_deadline(self.probe_timeout, self.probe.probe()) => result,
            };

            let transition = match result {
                Ok(Ok(())) => state.on_success(),
                Ok(Err(e)) => {
                    tracing::debug!(attempt = state.attempt(), error = %e, "Readiness probe failed");
                    state.on_failure(e.to_string())
                }
                Err(deadline) => {
                    let e = ProbeError::Timeout(deadline.0);
                    tracing::debug!(attempt = state.attempt(), error = %e, "Readiness probe failed");
                    state.on_failure(e.to_string())
                }
            };

            match transition {
                Transition::Ready => {
                    tracing::info!(probes, "Backend ready");
                    return HandshakeOutcome::Ready { probes };
                }
                Transition::GivenUp => {
                    tracing::warn!(
                        probes,
                        last_error = ?state.last_error(),
                        "Backend health check failed, but continuing to load app"
                    );
                    return HandshakeOutcome::GivenUp {
                        probes,
                        last_error: state.last_error().map(str::to_string),
                    };
                }
                Transition::RetryAfter(delay) => {
                    tracing::info!(attempt = state.attempt(), delay = ?delay, "Backend not ready, retrying");
                    tokio::select! {
                        biased;
                        _ = wait_for_shutdown(shutdown) => {
                            tracing::info!(probes, "Session ended, pending readiness timer cleared");
                            return HandshakeOutcome::Cancelled { probes };
                        }
                        _ = self.timer.sleep(delay) => {}
                    }
                }
            }
        }
    }
}

impl ReadinessHandshake<HttpProbe, TokioTimer> {
    /// HTTP handshake against `config.base_url` + `config.path`.
    pub fn http(config: &ReadinessConfig) -> Result<Self, ProbeError> {
        let probe = HttpProbe::new(
            &config.base_url,
            &config.path,
            Duration::from_secs(config.probe_timeout_secs),
        )?;
        Ok(Self::from_config(probe, TokioTimer, config))
    }
}

/// Runs the handshake at most once per session and caches the verdict.
#[derive(Debug)]
pub struct ReadinessGate {
    enabled: bool,
    outcome: OnceCell<HandshakeOutcome>,
}

impl ReadinessGate {
    /// `enabled` is the production-only switch.
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            outcome: OnceCell::new(),
        }
    }

    pub fn from_config(config: &ReadinessConfig) -> Self {
        Self::new(config.enabled)
    }

    /// Verdict for this session, running the handshake on first call.
    pub async fn ensure<P: Probe, T: Timer>(
        &self,
        handshake: &ReadinessHandshake<P, T>,
        shutdown: &mut broadcast::Receiver<()>,
    ) -> &HandshakeOutcome {
        self.outcome
            .get_or_init(|| async move {
                if self.enabled {
                    handshake.run(shutdown).await
                } else {
                    tracing::debug!("Readiness handshake disabled");
                    HandshakeOutcome::Skipped
                }
            })
            .await
    }

    /// Cached verdict, if the handshake already ran.
    pub fn outcome(&self) -> Option<&HandshakeOutcome> {
        self.outcome.get()
    }
}
