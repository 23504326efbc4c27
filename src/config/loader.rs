//! Configuration loading from disk and the process environment.

use std::fs;
use std::path::Path;

use crate::config::schema::{GatewayConfig, ReadinessConfig};
use crate::config::validation::{validate_config, validate_readiness, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration: optional TOML file, then environment overrides, then
/// validation.
///
/// `env` is the variable lookup, normally `|k| std::env::var(k).ok()`.
pub fn load_config<F>(path: Option<&Path>, env: F) -> Result<GatewayConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => GatewayConfig::default(),
    };

    apply_env_overrides(&mut config, env);
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Load only the client-side `[readiness]` section, for `wait-ready`.
///
/// Shares the gateway's file but none of its requirements: no secret or
/// storage URI is needed to wait for a backend.
pub fn load_readiness_config<F>(path: Option<&Path>, env: F) -> Result<ReadinessConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str::<GatewayConfig>(&content)?.readiness
        }
        None => ReadinessConfig::default(),
    };

    if let Some(url) = env("API_URL") {
        config.base_url = url;
    }
    if let Some(enabled) = env("READINESS_ENABLED") {
        match parse_flag(&enabled) {
            Some(enabled) => config.enabled = enabled,
            None => tracing::warn!(value = %enabled, "Ignoring unparseable READINESS_ENABLED"),
        }
    }

    validate_readiness(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Read the process environment.
pub fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Overlay the deployment environment onto a config.
///
/// Unparseable numeric or boolean values are ignored with a warning, leaving
/// the file/default value in place.
pub fn apply_env_overrides<F>(config: &mut GatewayConfig, env: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(port) = env("PORT") {
        match port.trim().parse() {
            Ok(port) => config.server.port = port,
            Err(_) => tracing::warn!(value = %port, "Ignoring unparseable PORT"),
        }
    }
    if let Some(secret) = env("JWT_SECRET") {
        config.auth.jwt_secret = Some(secret);
    }
    if let Some(expiration) = env("JWT_EXPIRATION") {
        config.auth.jwt_expiration = Some(expiration);
    }
    if let Some(uri) = env("MONGODB_URI") {
        config.storage.uri = Some(uri);
    }
    if let Some(origins) = env("FRONTEND_URL") {
        config.cors.allowed_origins = split_origins(&origins);
    }
    if let Some(demo) = env("DEMO_MODE") {
        match parse_flag(&demo) {
            Some(demo) => config.auth.demo_mode = demo,
            None => tracing::warn!(value = %demo, "Ignoring unparseable DEMO_MODE"),
        }
    }
    if let Some(level) = env("LOG_LEVEL") {
        config.observability.log_level = level;
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

/// Split a single origin or a comma-separated list, trimming each entry.
pub fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn test_env_only_config() {
        let env = env_from(&[
            ("PORT", "8088"),
            ("JWT_SECRET", "s3cret"),
            ("JWT_EXPIRATION", "7d"),
            ("MONGODB_URI", "mongodb://db:27017/peerhire"),
            ("FRONTEND_URL", " https://a.example , https://b.example:8443 "),
        ]);
        let config = load_config(None, env).unwrap();
        assert_eq!(config.server.port, 8088);
        assert_eq!(config.auth.jwt_secret.as_deref(), Some("s3cret"));
        assert_eq!(
            config.cors.allowed_origins,
            vec!["https://a.example".to_string(), "https://b.example:8443".to_string()]
        );
        assert!(!config.auth.demo_mode);
    }

    #[test]
    fn test_missing_required_is_fatal() {
        let env = env_from(&[("JWT_SECRET", "s3cret")]);
        match load_config(None, env) {
            Err(ConfigError::Validation(errors)) => {
                assert_eq!(errors.len(), 2);
            }
            other => panic!("expected validation failure, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_env_overrides_file() {
        let dir = std::env::temp_dir().join(format!("peerhire-cfg-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("gateway.toml");
        let mut file = fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
[server]
port = 4000

[auth]
jwt_secret = "from-file"
jwt_expiration = "1h"

[storage]
uri = "mongodb://file:27017"
"#
        )
        .unwrap();

        let env = env_from(&[("JWT_SECRET", "from-env"), ("DEMO_MODE", "true")]);
        let config = load_config(Some(&path), env).unwrap();
        assert_eq!(config.server.port, 4000);
        assert_eq!(config.auth.jwt_secret.as_deref(), Some("from-env"));
        assert!(config.auth.demo_mode);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_readiness_section_loads_without_server_settings() {
        let dir = std::env::temp_dir().join(format!("peerhire-cfg-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("gateway.toml");
        fs::write(
            &path,
            r#"
[readiness]
enabled = false
base_url = "https://api.peerhire.test"
probe_timeout_secs = 3
"#,
        )
        .unwrap();

        let config = load_readiness_config(Some(&path), env_from(&[])).unwrap();
        assert!(!config.enabled);
        assert_eq!(config.base_url, "https://api.peerhire.test");
        assert_eq!(config.path, "/spinup");
        assert_eq!(config.probe_timeout_secs, 3);

        let env = env_from(&[("API_URL", "http://backend:3000"), ("READINESS_ENABLED", "on")]);
        let config = load_readiness_config(Some(&path), env).unwrap();
        assert!(config.enabled);
        assert_eq!(config.base_url, "http://backend:3000");

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_readiness_budget_only_checked_for_client() {
        let env = env_from(&[
            ("JWT_SECRET", "s3cret"),
            ("JWT_EXPIRATION", "1h"),
            ("MONGODB_URI", "mongodb://db:27017"),
        ]);
        let dir = std::env::temp_dir().join(format!("peerhire-cfg-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("gateway.toml");
        fs::write(&path, "[readiness]\nmax_retries = 0\n").unwrap();

        assert!(load_config(Some(&path), env).is_ok());
        match load_readiness_config(Some(&path), env_from(&[])) {
            Err(ConfigError::Validation(errors)) => {
                assert_eq!(errors, vec![ValidationError::InvalidRetryBudget]);
            }
            other => panic!("expected validation failure, got {:?}", other.map(|_| ())),
        }

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_split_origins_drops_blanks() {
        assert_eq!(split_origins("a, ,b,"), vec!["a".to_string(), "b".to_string()]);
    }
}
