//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Compilation (at startup):
//!     prefix declarations {pattern, access}
//!     → matcher.rs (normalize & validate patterns)
//!     → router.rs (RouteTable, sorted by specificity)
//!
//! Per request:
//!     path → RouteTable::access_for → Public | Authenticated | Role(r)
//!     → consulted by the auth gate and the role gate
//! ```

pub mod matcher;
pub mod router;

pub use matcher::PathPrefix;
pub use router::{Access, RouteEntry, RouteTable, RouteTableBuilder, RouteTableError};
