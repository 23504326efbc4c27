//! Pipeline stages that apply to every request regardless of route.
//!
//! - `cors.rs`: origin negotiation and preflight answers
//! - `cache_policy.rs`: `Cache-Control` by request method
//!
//! Credential and role checks live in `crate::security`.

pub mod cache_policy;
pub mod cors;

pub use cache_policy::{annotate_cache_policy, CacheDirective};
pub use cors::{negotiate_origin, AllowedOrigins, OriginDecision, OriginError, OriginNegotiator};
