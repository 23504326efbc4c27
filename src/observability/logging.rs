//! Structured logging setup.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, ObservabilityConfig};

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn init_tracing(
    config: &ObservabilityConfig,
) -> Result<(), tracing_subscriber::util::TryInitError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(&config.log_level));
    let registry = tracing_subscriber::registry().with(filter);

    match config.log_format {
        LogFormat::Json => registry.with(fmt::layer().json()).try_init(),
        LogFormat::Pretty => registry.with(fmt::layer()).try_init(),
    }
}

fn default_filter(level: &str) -> EnvFilter {
    EnvFilter::new(format!("peerhire_gateway={level},wait_ready={level},tower_http=warn"))
}

/// Render a secret for the startup summary without revealing it.
pub fn mask(value: Option<&str>) -> &'static str {
    match value {
        Some(v) if !v.is_empty() => "**configured**",
        _ => "missing",
    }
}
