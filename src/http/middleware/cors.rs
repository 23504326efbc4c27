//! Origin negotiation (CORS).
//!
//! Decides per request whether the calling origin may read the response and
//! emits the matching `Access-Control-*` headers.
//!
//! # Decision Table
//! ```text
//! no Origin header          → Access-Control-Allow-Origin: *   (no credentials)
//! Origin in allow-list      → Access-Control-Allow-Origin: <origin>
//!                             Access-Control-Allow-Credentials: true
//! Origin not in allow-list  → no allow-origin header (browser blocks the read)
//! Origin not valid UTF-8    → treated as not in allow-list
//! ```
//!
//! A wildcard is never combined with credentials; browsers reject that pair.
//! Disallowed requests still execute server-side.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, HeaderName, HeaderValue, Method, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use url::Url;

use crate::http::request::context_mut;

/// Methods advertised on preflight.
pub const ALLOWED_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS, PATCH";
/// Request headers advertised on preflight.
pub const ALLOWED_HEADERS: &str = "Authorization, Content-Type, Accept, X-Requested-With, Origin";
/// Response headers scripts may read.
pub const EXPOSED_HEADERS: &str = "Content-Length, X-Powered-By";

/// Why an allow-list entry was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OriginError {
    #[error("allowed origin set is empty")]
    Empty,

    #[error("{0:?} is not a scheme://host[:port] origin")]
    Malformed(String),
}

/// Process-wide allow-list of origins. Immutable after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowedOrigins {
    origins: BTreeSet<String>,
}

impl AllowedOrigins {
    /// Build the set from configured entries, trimming whitespace.
    ///
    /// Fails if the set would be empty or an entry is not a bare origin
    /// (paths, queries and credentials are rejected).
    pub fn parse<S: AsRef<str>>(entries: &[S]) -> Result<Self, OriginError> {
        let mut origins = BTreeSet::new();
        for entry in entries {
            let entry = entry.as_ref().trim();
            if entry.is_empty() {
                continue;
            }
            origins.insert(normalize_origin(entry)?);
        }
        if origins.is_empty() {
            return Err(OriginError::Empty);
        }
        Ok(Self { origins })
    }

    /// Exact membership test against a request's `Origin` value.
    pub fn contains(&self, origin: &str) -> bool {
        self.origins.contains(origin.trim())
    }

    pub fn len(&self) -> usize {
        self.origins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.origins.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.origins.iter().map(String::as_str)
    }
}

fn normalize_origin(entry: &str) -> Result<String, OriginError> {
    let malformed = || OriginError::Malformed(entry.to_string());
    let url = Url::parse(entry).map_err(|_| malformed())?;
    if !url.has_host()
        || url.path() != "/"
        || url.query().is_some()
        || url.fragment().is_some()
        || !url.username().is_empty()
        || url.password().is_some()
    {
        return Err(malformed());
    }
    let origin = url.origin();
    if !origin.is_tuple() {
        return Err(malformed());
    }
    Ok(origin.ascii_serialization())
}

/// Outcome of negotiating one request's origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OriginDecision {
    /// No `Origin` header: same-origin or non-browser caller.
    Wildcard,
    /// Allow-listed origin, reflected verbatim with credentials.
    Reflect(String),
    /// Origin present but not allowed; no allow-origin header.
    Denied,
}

/// Stateless negotiator over the immutable allow-list.
#[derive(Debug)]
pub struct OriginNegotiator {
    allowed: AllowedOrigins,
    max_age: Duration,
}

impl OriginNegotiator {
    pub fn new(allowed: AllowedOrigins, max_age: Duration) -> Self {
        Self { allowed, max_age }
    }

    pub fn allowed(&self) -> &AllowedOrigins {
        &self.allowed
    }

    /// Decide for a request's `Origin` header value.
    pub fn decide(&self, origin: Option<&str>) -> OriginDecision {
        match origin {
            None => OriginDecision::Wildcard,
            Some(origin) if self.allowed.contains(origin) => {
                OriginDecision::Reflect(origin.trim().to_string())
            }
            Some(_) => OriginDecision::Denied,
        }
    }

    /// Decide for the raw header. A present but undecodable value is denied,
    /// never mistaken for an absent one.
    pub fn decide_header(&self, origin: Option<&HeaderValue>) -> OriginDecision {
        match origin.map(HeaderValue::to_str) {
            None => OriginDecision::Wildcard,
            Some(Ok(origin)) => self.decide(Some(origin)),
            Some(Err(_)) => OriginDecision::Denied,
        }
    }

    /// Write the origin-dependent headers for a decision.
    pub fn apply(&self, decision: &OriginDecision, headers: &mut HeaderMap) {
        match decision {
            OriginDecision::Wildcard => {
                headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
            }
            OriginDecision::Reflect(origin) => {
                if let Ok(value) = HeaderValue::from_str(origin) {
                    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, value);
                    headers.insert(
                        header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
                        HeaderValue::from_static("true"),
                    );
                }
                headers.append(header::VARY, HeaderValue::from_static("Origin"));
            }
            OriginDecision::Denied => {
                headers.remove(header::ACCESS_CONTROL_ALLOW_ORIGIN);
                headers.remove(header::ACCESS_CONTROL_ALLOW_CREDENTIALS);
                headers.append(header::VARY, HeaderValue::from_static("Origin"));
            }
        }
    }

    /// Headers for an actual (non-preflight) response.
    fn apply_simple(&self, decision: &OriginDecision, headers: &mut HeaderMap) {
        self.apply(decision, headers);
        if *decision != OriginDecision::Denied {
            headers.insert(
                header::ACCESS_CONTROL_EXPOSE_HEADERS,
                HeaderValue::from_static(EXPOSED_HEADERS),
            );
        }
    }

    /// Build the short-circuit answer to a preflight request.
    fn preflight_response(&self, decision: &OriginDecision) -> Response {
        let mut response = StatusCode::NO_CONTENT.into_response();
        let headers = response.headers_mut();
        self.apply(decision, headers);
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOWED_METHODS),
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOWED_HEADERS),
        );
        headers.insert(header::ACCESS_CONTROL_MAX_AGE, HeaderValue::from(self.max_age.as_secs()));
        response
    }
}

fn is_preflight(req: &Request<Body>) -> bool {
    req.method() == Method::OPTIONS
        && req
            .headers()
            .contains_key(HeaderName::from_static("access-control-request-method"))
}

/// Origin negotiation middleware.
///
/// Preflights are answered here and never reach authentication or handlers.
pub async fn negotiate_origin(
    State(negotiator): State<Arc<OriginNegotiator>>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let origin = req.headers().get(header::ORIGIN);
    let decision = negotiator.decide_header(origin);

    if decision == OriginDecision::Denied {
        tracing::debug!(origin = ?origin, "Origin not in allow-list");
    }

    let preflight = is_preflight(&req);
    context_mut(&mut req).decided_origin = Some(decision.clone());

    if preflight {
        return negotiator.preflight_response(&decision);
    }

    let mut response = next.run(req).await;
    negotiator.apply_simple(&decision, response.headers_mut());
    response
}
