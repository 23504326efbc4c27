//! Shared utilities for integration testing.
#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, Response};
use peerhire_gateway::config::GatewayConfig;
use peerhire_gateway::health::{DependencyCheck, DependencyError};
use peerhire_gateway::lifecycle::Shutdown;
use peerhire_gateway::security::{JwtIssuer, Role};
use peerhire_gateway::HttpServer;
use serde_json::Value;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;

pub const SECRET: &str = "integration-secret";
pub const FRONTEND: &str = "https://app.peerhire.test";

/// A complete, valid configuration for in-process servers.
pub fn test_config() -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.server.host = "127.0.0.1".into();
    config.server.port = 0;
    config.auth.jwt_secret = Some(SECRET.into());
    config.auth.jwt_expiration = Some("1h".into());
    config.storage.uri = Some("mongodb://127.0.0.1:27017/peerhire".into());
    config.cors.allowed_origins = vec![FRONTEND.into()];
    config
}

/// Bearer value for a credential signed with the test secret.
pub fn bearer(subject_id: &str, role: Role) -> String {
    let issuer = JwtIssuer::new(SECRET, Duration::from_secs(3600));
    let credential = issuer.issue(subject_id, role).unwrap();
    format!("Bearer {}", credential.token)
}

/// Bearer value for a credential that expired a minute ago.
pub fn expired_bearer(subject_id: &str, role: Role) -> String {
    let now = chrono::Utc::now().timestamp() as u64;
    let claims = serde_json::json!({
        "sub": subject_id,
        "role": role.as_str(),
        "iat": now - 3660,
        "exp": now - 60,
    });
    let token = jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap();
    format!("Bearer {}", token)
}

pub fn get(path: &str) -> Request<Body> {
    Request::get(path).body(Body::empty()).unwrap()
}

pub fn get_with(path: &str, headers: &[(&str, &str)]) -> Request<Body> {
    let mut builder = Request::get(path);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    builder.body(Body::empty()).unwrap()
}

pub async fn json_body(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Dependency with a fixed verdict.
pub struct StaticCheck {
    pub name: &'static str,
    pub healthy: bool,
}

impl DependencyCheck for StaticCheck {
    fn name(&self) -> &str {
        self.name
    }

    fn check(&self) -> Result<(), DependencyError> {
        if self.healthy {
            Ok(())
        } else {
            Err(DependencyError::Disconnected(self.name.to_string()))
        }
    }
}

pub fn failing_dependency() -> Arc<dyn DependencyCheck> {
    Arc::new(StaticCheck {
        name: "storage",
        healthy: false,
    })
}

/// Serve `server` on an ephemeral port until `shutdown` fires.
pub async fn spawn_gateway(server: HttpServer, shutdown: &Shutdown) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });
    addr
}

/// Start a programmable mock backend on an ephemeral port.
///
/// `f` is called once per connection and returns the status and body.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        let (status, body) = f().await;
                        let status_text = match status {
                            200 => "200 OK",
                            204 => "204 No Content",
                            404 => "404 Not Found",
                            500 => "500 Internal Server Error",
                            502 => "502 Bad Gateway",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };

                        let response_str = format!(
                            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}
