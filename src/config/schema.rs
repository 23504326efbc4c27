//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files; the
//! secrets and deployment-specific values are normally supplied through the
//! environment (see `loader.rs`).

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default allow-listed origin when `FRONTEND_URL` is not configured.
pub const DEFAULT_FRONTEND_URL: &str = "https://hackhazards25-peer-hire.onrender.com";

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (host, port, service identity).
    pub server: ServerConfig,

    /// Credential verification settings.
    pub auth: AuthConfig,

    /// Cross-origin policy.
    pub cors: CorsConfig,

    /// Storage connection (external collaborator).
    pub storage: StorageConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Client-side readiness handshake settings.
    pub readiness: ReadinessConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind (e.g., "0.0.0.0").
    pub host: String,

    /// Listening port.
    pub port: u16,

    /// Name reported by the root info endpoint.
    pub service_name: String,

    /// Maximum accepted request body in bytes.
    pub max_body_bytes: usize,
}

impl ServerConfig {
    /// `host:port` string suitable for `TcpListener::bind`.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            service_name: "PeerHire API".to_string(),
            max_body_bytes: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Bearer credential settings.
#[derive(Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AuthConfig {
    /// Shared signing secret. Required.
    pub jwt_secret: Option<String>,

    /// Credential lifetime, e.g. "3600", "30m", "7d". Required.
    pub jwt_expiration: Option<String>,

    /// Enables the built-in demo credential issuer under `/auth`.
    pub demo_mode: bool,
}

impl AuthConfig {
    /// Parsed credential lifetime, if present and well-formed.
    pub fn expiration(&self) -> Option<Duration> {
        self.jwt_expiration.as_deref().and_then(parse_duration)
    }
}

// Keep the secret out of Debug output.
impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &self.jwt_secret.as_ref().map(|_| "**configured**"))
            .field("jwt_expiration", &self.jwt_expiration)
            .field("demo_mode", &self.demo_mode)
            .finish()
    }
}

/// Cross-origin configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Allow-listed origins (scheme://host[:port]).
    pub allowed_origins: Vec<String>,

    /// Preflight cache lifetime in seconds.
    pub max_age_secs: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![DEFAULT_FRONTEND_URL.to_string()],
            max_age_secs: 86_400,
        }
    }
}

/// Storage connection configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Connection string (e.g., "mongodb://db:27017/peerhire"). Required.
    pub uri: Option<String>,

    /// Connect timeout in seconds.
    pub connect_timeout_secs: u64,

    /// Seconds between background reachability checks while connected.
    pub check_interval_secs: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            uri: None,
            connect_timeout_secs: 5,
            check_interval_secs: 15,
        }
    }
}

impl std::fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageConfig")
            .field("uri", &self.uri.as_ref().map(|_| "**configured**"))
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("check_interval_secs", &self.check_interval_secs)
            .finish()
    }
}

/// Timeout configuration for inbound requests.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Readiness handshake configuration (client side).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ReadinessConfig {
    /// Run the handshake at all. Off outside production builds.
    pub enabled: bool,

    /// Backend base URL the probe targets.
    pub base_url: String,

    /// Liveness path appended to `base_url`.
    pub path: String,

    /// Probes that may fail before giving up.
    pub max_retries: u32,

    /// Unit of the exponential delay in seconds (delay = unit * 2^attempt).
    pub base_delay_secs: u64,

    /// Per-probe deadline in seconds.
    pub probe_timeout_secs: u64,
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "http://localhost:3000".to_string(),
            path: "/spinup".to_string(),
            max_retries: 5,
            base_delay_secs: 1,
            probe_timeout_secs: 8,
        }
    }
}

/// Parse a lifetime like "3600", "45s", "30m", "12h" or "7d".
pub fn parse_duration(raw: &str) -> Option<Duration> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let (digits, unit) = match raw.find(|c: char| !c.is_ascii_digit()) {
        Some(idx) => raw.split_at(idx),
        None => (raw, "s"),
    };
    let value: u64 = digits.parse().ok()?;
    let multiplier = match unit.trim() {
        "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        "d" => 24 * 60 * 60,
        _ => return None,
    };
    let secs = value.checked_mul(multiplier)?;
    if secs == 0 {
        return None;
    }
    Some(Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration_units() {
        assert_eq!(parse_duration("3600"), Some(Duration::from_secs(3600)));
        assert_eq!(parse_duration("45s"), Some(Duration::from_secs(45)));
        assert_eq!(parse_duration("30m"), Some(Duration::from_secs(1800)));
        assert_eq!(parse_duration("12h"), Some(Duration::from_secs(43_200)));
        assert_eq!(parse_duration(" 7d "), Some(Duration::from_secs(604_800)));
    }

    #[test]
    fn test_parse_duration_rejects_garbage() {
        assert_eq!(parse_duration(""), None);
        assert_eq!(parse_duration("0"), None);
        assert_eq!(parse_duration("d7"), None);
        assert_eq!(parse_duration("10y"), None);
        assert_eq!(parse_duration("ten"), None);
    }

    #[test]
    fn test_debug_masks_secrets() {
        let auth = AuthConfig {
            jwt_secret: Some("hunter2".into()),
            jwt_expiration: Some("1h".into()),
            demo_mode: false,
        };
        let printed = format!("{:?}", auth);
        assert!(!printed.contains("hunter2"));
        assert!(printed.contains("**configured**"));
    }
}
