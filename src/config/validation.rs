//! Configuration validation.
//!
//! Semantic checks that serde cannot express: required secrets present,
//! lifetimes parseable, origins well-formed. Every error is collected so the
//! operator sees the whole list at once.

use crate::config::schema::{GatewayConfig, ReadinessConfig};
use crate::http::middleware::cors::{AllowedOrigins, OriginError};

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// A required setting is absent. Fatal at startup.
    #[error("configuration missing: {0}")]
    ConfigurationMissing(&'static str),

    #[error("invalid credential expiration {0:?} (expected e.g. \"3600\", \"30m\", \"7d\")")]
    InvalidExpiration(String),

    #[error("invalid allowed origin: {0}")]
    InvalidOrigin(#[from] OriginError),

    #[error("listening port must be non-zero")]
    InvalidPort,

    #[error("storage.check_interval_secs must be non-zero")]
    InvalidCheckInterval,

    #[error("readiness.max_retries must be at least 1")]
    InvalidRetryBudget,

    #[error("readiness.probe_timeout_secs must be non-zero")]
    InvalidProbeTimeout,
}

/// Validate a loaded configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    match config.auth.jwt_secret.as_deref() {
        Some(secret) if !secret.trim().is_empty() => {}
        _ => errors.push(ValidationError::ConfigurationMissing("JWT_SECRET")),
    }

    match config.auth.jwt_expiration.as_deref() {
        None => errors.push(ValidationError::ConfigurationMissing("JWT_EXPIRATION")),
        Some(raw) if raw.trim().is_empty() => {
            errors.push(ValidationError::ConfigurationMissing("JWT_EXPIRATION"))
        }
        Some(raw) => {
            if config.auth.expiration().is_none() {
                errors.push(ValidationError::InvalidExpiration(raw.to_string()));
            }
        }
    }

    match config.storage.uri.as_deref() {
        Some(uri) if !uri.trim().is_empty() => {}
        _ => errors.push(ValidationError::ConfigurationMissing("MONGODB_URI")),
    }

    if let Err(e) = AllowedOrigins::parse(&config.cors.allowed_origins) {
        errors.push(e.into());
    }

    if config.server.port == 0 {
        errors.push(ValidationError::InvalidPort);
    }

    if config.storage.check_interval_secs == 0 {
        errors.push(ValidationError::InvalidCheckInterval);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate the client-side readiness section on its own.
pub fn validate_readiness(config: &ReadinessConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.max_retries == 0 {
        errors.push(ValidationError::InvalidRetryBudget);
    }
    if config.probe_timeout_secs == 0 {
        errors.push(ValidationError::InvalidProbeTimeout);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
