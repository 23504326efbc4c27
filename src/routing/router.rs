//! Tagged route table.
//!
//! # Responsibilities
//! - Declare, per path prefix, whether a credential and which role is required
//! - Validate entries once, at registration
//! - Answer "what does this path require?" for the auth and role gates
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - Longest matching prefix wins
//! - Paths no entry covers are public (root info, health, fallback)

use crate::routing::matcher::PathPrefix;
use crate::security::credentials::Role;

/// What a route requires from the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// No credential checked.
    Public,
    /// Any verified subject.
    Authenticated,
    /// Verified subject with exactly this role.
    Role(Role),
}

impl Access {
    pub fn requires_credential(&self) -> bool {
        !matches!(self, Access::Public)
    }

    pub fn required_role(&self) -> Option<Role> {
        match self {
            Access::Role(role) => Some(*role),
            _ => None,
        }
    }
}

/// One table row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteEntry {
    pub prefix: PathPrefix,
    pub access: Access,
}

/// Registration failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouteTableError {
    #[error("invalid route pattern {0:?}")]
    InvalidPattern(String),

    #[error("route pattern {0:?} registered twice")]
    Duplicate(String),

    #[error("role-restricted route {0:?} is not under an authenticated prefix")]
    RoleOutsideProtectedPrefix(String),
}

/// Builder for a validated `RouteTable`.
#[derive(Debug, Default)]
pub struct RouteTableBuilder {
    pending: Vec<(String, Access)>,
}

impl RouteTableBuilder {
    pub fn public(mut self, pattern: &str) -> Self {
        self.pending.push((pattern.to_string(), Access::Public));
        self
    }

    pub fn authenticated(mut self, pattern: &str) -> Self {
        self.pending.push((pattern.to_string(), Access::Authenticated));
        self
    }

    pub fn role(mut self, pattern: &str, role: Role) -> Self {
        self.pending.push((pattern.to_string(), Access::Role(role)));
        self
    }

    pub fn build(self) -> Result<RouteTable, RouteTableError> {
        let mut entries: Vec<RouteEntry> = Vec::with_capacity(self.pending.len());
        for (pattern, access) in self.pending {
            let prefix = PathPrefix::parse(&pattern)
                .ok_or_else(|| RouteTableError::InvalidPattern(pattern.clone()))?;
            if entries.iter().any(|e| e.prefix == prefix) {
                return Err(RouteTableError::Duplicate(pattern));
            }
            entries.push(RouteEntry { prefix, access });
        }

        // A role check without a credential check in front of it is a
        // registration mistake, not something to discover per request.
        for entry in entries.iter().filter(|e| matches!(e.access, Access::Role(_))) {
            let guarded = entries.iter().any(|outer| {
                outer.prefix != entry.prefix
                    && outer.access == Access::Authenticated
                    && outer.prefix.matches(entry.prefix.as_str())
            });
            if !guarded {
                return Err(RouteTableError::RoleOutsideProtectedPrefix(
                    entry.prefix.as_str().to_string(),
                ));
            }
        }

        entries.sort_by(|a, b| b.prefix.specificity().cmp(&a.prefix.specificity()));
        Ok(RouteTable { entries })
    }
}

/// Compiled access table.
#[derive(Debug, Clone)]
pub struct RouteTable {
    entries: Vec<RouteEntry>,
}

impl RouteTable {
    pub fn builder() -> RouteTableBuilder {
        RouteTableBuilder::default()
    }

    /// The marketplace layout: `/auth` public, `/api` authenticated,
    /// `/api/client` and `/api/freelancer` role-restricted.
    pub fn marketplace() -> Result<Self, RouteTableError> {
        Self::builder()
            .public("/auth")
            .authenticated("/api")
            .role("/api/client/*", Role::Client)
            .role("/api/freelancer/*", Role::Freelancer)
            .build()
    }

    /// Requirement for a request path.
    pub fn access_for(&self, path: &str) -> Access {
        self.entries
            .iter()
            .find(|e| e.prefix.matches(path))
            .map(|e| e.access)
            .unwrap_or(Access::Public)
    }

    pub fn entries(&self) -> &[RouteEntry] {
        &self.entries
    }
}
