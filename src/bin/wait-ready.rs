//! Wait for the API to come up before starting the UI.
//!
//! Reads the `[readiness]` section of the gateway config (`GATEWAY_CONFIG`),
//! then `API_URL` / `READINESS_ENABLED`, then flags. Runs the handshake once
//! and exits 0 whether the backend answered or the retry budget ran out.
//! Ctrl+C before a verdict exits 130.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use peerhire_gateway::config::loader::process_env;
use peerhire_gateway::config::{load_readiness_config, ObservabilityConfig, ReadinessConfig};
use peerhire_gateway::lifecycle::{spawn_signal_listener, Shutdown};
use peerhire_gateway::observability::logging::init_tracing;
use peerhire_gateway::readiness::{HandshakeOutcome, ReadinessGate, ReadinessHandshake};

#[derive(Parser)]
#[command(name = "wait-ready")]
#[command(about = "Wait for the PeerHire API to finish spinning up", long_about = None)]
struct Cli {
    /// Gateway config file to read `[readiness]` from. Defaults to `GATEWAY_CONFIG`.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Backend base URL.
    #[arg(short, long)]
    url: Option<String>,

    /// Liveness path.
    #[arg(short, long)]
    path: Option<String>,

    /// Probes allowed to fail before giving up.
    #[arg(long)]
    max_retries: Option<u32>,

    /// Backoff unit in seconds.
    #[arg(long)]
    base_delay: Option<u64>,

    /// Per-probe timeout in seconds.
    #[arg(short, long)]
    timeout: Option<u64>,

    /// Skip the handshake (non-production builds).
    #[arg(long)]
    skip: bool,
}

impl Cli {
    fn apply(&self, config: &mut ReadinessConfig) {
        if let Some(url) = &self.url {
            config.base_url = url.clone();
        }
        if let Some(path) = &self.path {
            config.path = path.clone();
        }
        if let Some(max_retries) = self.max_retries {
            config.max_retries = max_retries.max(1);
        }
        if let Some(base_delay) = self.base_delay {
            config.base_delay_secs = base_delay;
        }
        if let Some(timeout) = self.timeout {
            config.probe_timeout_secs = timeout.max(1);
        }
        if self.skip {
            config.enabled = false;
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let _ = init_tracing(&ObservabilityConfig::default());

    let path = cli.config.clone().or_else(|| process_env("GATEWAY_CONFIG").map(PathBuf::from));
    let mut config = match load_readiness_config(path.as_deref(), process_env) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    cli.apply(&mut config);

    let handshake = match ReadinessHandshake::http(&config) {
        Ok(handshake) => handshake,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let shutdown = Arc::new(Shutdown::new());
    let mut rx = shutdown.subscribe();
    spawn_signal_listener(shutdown);

    let gate = ReadinessGate::from_config(&config);
    match gate.ensure(&handshake, &mut rx).await {
        HandshakeOutcome::Ready { probes } => {
            println!("Backend ready after {} probe(s)", probes);
            ExitCode::SUCCESS
        }
        HandshakeOutcome::GivenUp { probes, last_error } => {
            eprintln!(
                "Warning: backend health check failed after {} probe(s) ({}), continuing anyway",
                probes,
                last_error.as_deref().unwrap_or("unknown error")
            );
            ExitCode::SUCCESS
        }
        HandshakeOutcome::Skipped => ExitCode::SUCCESS,
        HandshakeOutcome::Cancelled { .. } => ExitCode::from(130),
    }
}
