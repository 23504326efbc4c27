//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Request on a credentialed path:
//!     → auth.rs (extract bearer token, verify, attach subject) ── 401
//!     → roles.rs (compare subject role with route requirement) ── 403
//!     → handler
//!
//! credentials.rs: Role, AuthenticatedSubject, CredentialVerifier,
//!                 JwtVerifier / JwtIssuer (HS256, shared secret)
//! ```
//!
//! # Design Decisions
//! - Gates decide locally and short-circuit; no partial authentication
//! - Verification is a trait so the token format stays pluggable
//! - Failure reasons are logged, callers get a generic message

pub mod auth;
pub mod credentials;
pub mod roles;

pub use auth::{auth_gate, AuthGate};
pub use credentials::{
    AuthError, AuthenticatedSubject, CredentialVerifier, IssuedCredential, JwtIssuer,
    JwtVerifier, Role,
};
pub use roles::role_gate;
