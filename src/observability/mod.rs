//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Pipeline stages produce:
//!     → logging.rs (subscriber setup: env filter, pretty/json output)
//!     → metrics.rs (request counters, latency histogram, auth rejections)
//!
//! Consumers:
//!     → stdout (log aggregation)
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Structured fields on every event; `request_id` joins a request's lines
//! - Metrics are cheap (atomic increments) and recorded even with no exporter

pub mod logging;
pub mod metrics;
