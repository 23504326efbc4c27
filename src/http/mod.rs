//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, pipeline assembly)
//!     → request.rs (correlation ID, RequestContext, access log)
//!     → middleware/cors.rs (origin decision, preflight)
//!     → middleware/cache_policy.rs (Cache-Control)
//!     → security gates (credential, role)
//!     → handlers.rs | fallback (404)
//!     → response.rs (error taxonomy → JSON)
//! ```

pub mod handlers;
pub mod middleware;
pub mod request;
pub mod response;
pub mod server;

pub use request::{CorrelationId, RequestContext};
pub use response::ApiError;
pub use server::{BuildError, HttpServer, HttpServerBuilder};
