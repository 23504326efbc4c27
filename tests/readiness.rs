//! Readiness handshake against live HTTP backends.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use peerhire_gateway::config::ReadinessConfig;
use peerhire_gateway::lifecycle::Shutdown;
use peerhire_gateway::readiness::{
    HandshakeOutcome, HttpProbe, Probe, ProbeError, ReadinessGate, ReadinessHandshake,
    RetryPolicy, TokioTimer,
};
use peerhire_gateway::HttpServer;

mod common;

/// Millisecond backoff so the schedule runs quickly against real sockets.
fn fast_policy() -> RetryPolicy {
    RetryPolicy {
        max_retries: 5,
        unit: Duration::from_millis(10),
    }
}

#[tokio::test]
async fn test_probe_accepts_any_2xx() {
    let ok = common::start_programmable_backend(|| async { (200, r#"{"status":"ok"}"#.into()) }).await;
    let no_content = common::start_programmable_backend(|| async { (204, String::new()) }).await;

    for addr in [ok, no_content] {
        let probe = HttpProbe::new(&format!("http://{}/", addr), "/spinup", Duration::from_secs(2)).unwrap();
        assert_eq!(probe.url(), format!("http://{}/spinup", addr));
        assert_eq!(probe.probe().await, Ok(()));
    }
}

#[tokio::test]
async fn test_probe_reports_non_2xx() {
    let addr = common::start_programmable_backend(|| async { (503, "waking up".into()) }).await;
    let probe = HttpProbe::new(&format!("http://{}", addr), "/spinup", Duration::from_secs(2)).unwrap();

    assert_eq!(probe.probe().await, Err(ProbeError::Status(503)));
}

#[tokio::test]
async fn test_probe_reports_refused_connection() {
    // Bind then drop to get a port nothing listens on.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let probe = HttpProbe::new(&format!("http://{}", addr), "/spinup", Duration::from_secs(2)).unwrap();
    assert!(matches!(probe.probe().await, Err(ProbeError::Network(_))));
}

#[tokio::test]
async fn test_cold_backend_becomes_ready() {
    let calls = Arc::new(AtomicU32::new(0));
    let cc = calls.clone();
    let addr = common::start_programmable_backend(move || {
        let cc = cc.clone();
        async move {
            if cc.fetch_add(1, Ordering::SeqCst) < 2 {
                (502, "Bad Gateway".into())
            } else {
                (200, r#"{"status":"ok"}"#.into())
            }
        }
    })
    .await;

    let probe = HttpProbe::new(&format!("http://{}", addr), "/spinup", Duration::from_secs(2)).unwrap();
    let handshake = ReadinessHandshake::new(probe, TokioTimer, fast_policy(), Duration::from_secs(2));
    let shutdown = Shutdown::new();

    let outcome = handshake.run(&mut shutdown.subscribe()).await;

    assert_eq!(outcome, HandshakeOutcome::Ready { probes: 3 });
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_dead_backend_fails_open() {
    let calls = Arc::new(AtomicU32::new(0));
    let cc = calls.clone();
    let addr = common::start_programmable_backend(move || {
        let cc = cc.clone();
        async move {
            cc.fetch_add(1, Ordering::SeqCst);
            (500, "down".into())
        }
    })
    .await;

    let probe = HttpProbe::new(&format!("http://{}", addr), "/spinup", Duration::from_secs(2)).unwrap();
    let handshake = ReadinessHandshake::new(probe, TokioTimer, fast_policy(), Duration::from_secs(2));
    let shutdown = Shutdown::new();
    let gate = ReadinessGate::new(true);

    let outcome = gate.ensure(&handshake, &mut shutdown.subscribe()).await;

    assert!(matches!(outcome, HandshakeOutcome::GivenUp { probes: 5, .. }));
    assert!(outcome.should_render());
    assert_eq!(calls.load(Ordering::SeqCst), 5);
}

#[tokio::test]
async fn test_handshake_against_gateway_spinup() {
    let shutdown = Shutdown::new();
    let server = HttpServer::builder(Arc::new(common::test_config()))
        .dependency(common::failing_dependency())
        .build()
        .unwrap();
    let addr = common::spawn_gateway(server, &shutdown).await;

    let probe = HttpProbe::new(&format!("http://{}", addr), "/spinup", Duration::from_secs(2)).unwrap();
    let handshake = ReadinessHandshake::new(probe, TokioTimer, fast_policy(), Duration::from_secs(2));
    let session = Shutdown::new();

    // Liveness answers even while storage is down.
    let outcome = handshake.run(&mut session.subscribe()).await;
    assert_eq!(outcome, HandshakeOutcome::Ready { probes: 1 });

    shutdown.trigger();
}

#[tokio::test]
async fn test_handshake_built_from_config() {
    let calls = Arc::new(AtomicU32::new(0));
    let cc = calls.clone();
    let addr = common::start_programmable_backend(move || {
        cc.fetch_add(1, Ordering::SeqCst);
        async { (200, r#"{"status":"ok"}"#.into()) }
    })
    .await;

    let mut config = ReadinessConfig {
        base_url: format!("http://{}", addr),
        ..ReadinessConfig::default()
    };
    let shutdown = Shutdown::new();

    let handshake = ReadinessHandshake::http(&config).unwrap();
    assert_eq!(handshake.probe().url(), format!("http://{}/spinup", addr));
    let outcome = ReadinessGate::from_config(&config)
        .ensure(&handshake, &mut shutdown.subscribe())
        .await
        .clone();
    assert_eq!(outcome, HandshakeOutcome::Ready { probes: 1 });

    config.enabled = false;
    let handshake = ReadinessHandshake::http(&config).unwrap();
    let outcome = ReadinessGate::from_config(&config)
        .ensure(&handshake, &mut shutdown.subscribe())
        .await
        .clone();
    assert_eq!(outcome, HandshakeOutcome::Skipped);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}
