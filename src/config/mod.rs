//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! gateway.toml (optional, GATEWAY_CONFIG)
//!     → loader.rs (parse & deserialize)
//!     → environment overlay (PORT, JWT_SECRET, JWT_EXPIRATION,
//!       MONGODB_URI, FRONTEND_URL, DEMO_MODE)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → shared via Arc to the pipeline constructor
//! ```
//!
//! # Design Decisions
//! - Config is read once at startup, never per request
//! - Missing secret, expiration or storage URI is fatal
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_readiness_config, ConfigError};
pub use schema::{
    AuthConfig, CorsConfig, GatewayConfig, LogFormat, ObservabilityConfig, ReadinessConfig,
    ServerConfig, StorageConfig, TimeoutConfig,
};
pub use validation::ValidationError;
