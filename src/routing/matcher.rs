//! Path prefix matching.
//!
//! # Design Decisions
//! - Matching is segment-aware: `/api` covers `/api` and `/api/...`, never `/apiary`
//! - Path matching is case-sensitive
//! - No regex to guarantee O(n) matching

/// A normalized, `/`-rooted path prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PathPrefix {
    prefix: String,
}

impl PathPrefix {
    /// Normalize a prefix: must start with `/`; trailing slashes and a
    /// trailing `/*` wildcard are dropped (`/api/client/*` == `/api/client`).
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if !raw.starts_with('/') || raw.contains(['?', '#', ' ']) {
            return None;
        }
        let trimmed = raw.strip_suffix("/*").unwrap_or(raw);
        let trimmed = trimmed.trim_end_matches('/');
        if trimmed.contains('*') {
            return None;
        }
        Some(Self {
            prefix: trimmed.to_string(),
        })
    }

    pub fn as_str(&self) -> &str {
        if self.prefix.is_empty() {
            "/"
        } else {
            &self.prefix
        }
    }

    /// Number of characters matched; longer prefixes are more specific.
    pub fn specificity(&self) -> usize {
        self.prefix.len()
    }

    pub fn matches(&self, path: &str) -> bool {
        match path.strip_prefix(self.prefix.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_boundaries() {
        let api = PathPrefix::parse("/api").unwrap();
        assert!(api.matches("/api"));
        assert!(api.matches("/api/"));
        assert!(api.matches("/api/client/jobs"));
        assert!(!api.matches("/apiary"));
        assert!(!api.matches("/"));
    }

    #[test]
    fn test_wildcard_suffix_normalized() {
        assert_eq!(PathPrefix::parse("/api/client/*"), PathPrefix::parse("/api/client"));
        assert_eq!(PathPrefix::parse("/api/"), PathPrefix::parse("/api"));
    }

    #[test]
    fn test_root_matches_everything() {
        let root = PathPrefix::parse("/").unwrap();
        assert_eq!(root.as_str(), "/");
        assert!(root.matches("/anything"));
        assert!(root.matches("/"));
    }

    #[test]
    fn test_invalid_prefixes() {
        assert!(PathPrefix::parse("api").is_none());
        assert!(PathPrefix::parse("/a/*/b").is_none());
        assert!(PathPrefix::parse("/a?x=1").is_none());
    }

    #[test]
    fn test_case_sensitive() {
        let p = PathPrefix::parse("/api").unwrap();
        assert!(!p.matches("/API/x"));
    }
}
