//! PeerHire API gateway library.
//!
//! Request admission for the marketplace backend (correlation, origin
//! negotiation, cache policy, credential and role gates, health endpoints)
//! plus the client-side readiness handshake that waits for a cold backend.

pub mod config;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod readiness;
pub mod resilience;
pub mod routing;
pub mod security;

pub use config::schema::GatewayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
