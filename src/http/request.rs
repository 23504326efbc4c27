//! Request context and correlation logging.
//!
//! # Responsibilities
//! - Generate a unique correlation ID (UUID v4) per request
//! - Carry the per-request `RequestContext` through every pipeline stage
//! - Log entry and exit with method, path, status and duration
//!
//! # Design Decisions
//! - Correlation runs outermost so its duration covers every other stage
//! - Inbound `X-Request-Id` headers are not trusted; IDs are always fresh
//! - The logger observes the response, it never alters it

use std::fmt;
use std::time::Instant;

use axum::{
    body::Body,
    http::{header, Method, Request},
    middleware::Next,
    response::Response,
};
use chrono::{DateTime, SecondsFormat, Utc};
use tracing::Instrument;
use uuid::Uuid;

use crate::http::middleware::cache_policy::CacheDirective;
use crate::http::middleware::cors::OriginDecision;
use crate::observability::metrics;
use crate::security::credentials::AuthenticatedSubject;

/// Log target for the entry/exit access records.
pub const ACCESS_LOG_TARGET: &str = "peerhire_gateway::access";

/// Opaque per-request identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CorrelationId(Uuid);

impl CorrelationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// State owned by a single request's execution.
///
/// Created at pipeline entry; each stage appends what it derived.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub correlation_id: CorrelationId,
    pub method: Method,
    pub path: String,
    pub received_at: DateTime<Utc>,
    pub origin: Option<String>,
    /// Set by the origin negotiator.
    pub decided_origin: Option<OriginDecision>,
    /// Set by the cache-policy annotator.
    pub cache_directive: Option<CacheDirective>,
    /// Set by the auth gate on protected routes.
    pub subject: Option<AuthenticatedSubject>,
}

impl RequestContext {
    pub fn new(method: Method, path: impl Into<String>, origin: Option<String>) -> Self {
        Self {
            correlation_id: CorrelationId::new(),
            method,
            path: path.into(),
            received_at: Utc::now(),
            origin,
            decided_origin: None,
            cache_directive: None,
            subject: None,
        }
    }

    /// Start a context for an inbound request.
    pub fn begin<B>(req: &Request<B>) -> Self {
        // Undecodable bytes are kept (lossily) so a garbled header still
        // reads as present.
        let origin = req
            .headers()
            .get(header::ORIGIN)
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned());
        Self::new(req.method().clone(), req.uri().path(), origin)
    }
}

/// Mutable access to the request's context, creating one if a stage runs
/// without the correlation logger in front of it.
pub fn context_mut<B>(req: &mut Request<B>) -> &mut RequestContext {
    let ctx = match req.extensions_mut().remove::<RequestContext>() {
        Some(ctx) => ctx,
        None => RequestContext::begin(req),
    };
    req.extensions_mut().get_or_insert(ctx)
}

/// Correlation logging middleware.
pub async fn correlate(mut req: Request<Body>, next: Next) -> Response {
    let started = Instant::now();
    let ctx = RequestContext::begin(&req);
    let id = ctx.correlation_id;
    let method = ctx.method.clone();
    let path = ctx.path.clone();

    tracing::info!(
        target: ACCESS_LOG_TARGET,
        timestamp = %ctx.received_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        request_id = %id,
        method = %method,
        path = %path,
        "request started"
    );

    req.extensions_mut().insert(ctx);

    let span = tracing::info_span!("request", request_id = %id);
    let response = next.run(req).instrument(span).await;

    let elapsed = started.elapsed();
    let status = response.status();
    tracing::info!(
        target: ACCESS_LOG_TARGET,
        timestamp = %Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        request_id = %id,
        method = %method,
        path = %path,
        status = status.as_u16(),
        duration_ms = elapsed.as_millis() as u64,
        "request completed"
    );
    metrics::record_request(method.as_str(), status.as_u16(), elapsed);

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, middleware::from_fn, routing::post, Router};
    use std::collections::BTreeMap;
    use std::sync::{Arc, Mutex};
    use tower::ServiceExt;
    use tracing::field::{Field, Visit};
    use tracing_subscriber::layer::{Context, SubscriberExt};
    use tracing_subscriber::Layer;

    /// One emitted event: target plus rendered fields.
    struct Captured {
        target: String,
        fields: BTreeMap<String, String>,
    }

    #[derive(Clone, Default)]
    struct CaptureLayer(Arc<Mutex<Vec<Captured>>>);

    struct FieldVisitor<'a>(&'a mut BTreeMap<String, String>);

    impl Visit for FieldVisitor<'_> {
        fn record_str(&mut self, field: &Field, value: &str) {
            self.0.insert(field.name().to_string(), value.to_string());
        }

        fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
            self.0.insert(field.name().to_string(), format!("{:?}", value));
        }
    }

    impl<S: tracing::Subscriber> Layer<S> for CaptureLayer {
        fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
            let mut fields = BTreeMap::new();
            event.record(&mut FieldVisitor(&mut fields));
            self.0.lock().unwrap().push(Captured {
                target: event.metadata().target().to_string(),
                fields,
            });
        }
    }

    #[test]
    fn test_correlation_ids_are_unique() {
        let a = CorrelationId::new();
        let b = CorrelationId::new();
        assert_ne!(a, b);
        assert_eq!(a.to_string().len(), 36);
    }

    #[test]
    fn test_begin_captures_request_fields() {
        let req = Request::builder()
            .method(Method::POST)
            .uri("http://example.com/api/client/jobs?page=2")
            .header("Origin", "https://a.example")
            .body(Body::empty())
            .unwrap();
        let ctx = RequestContext::begin(&req);
        assert_eq!(ctx.method, Method::POST);
        assert_eq!(ctx.path, "/api/client/jobs");
        assert_eq!(ctx.origin.as_deref(), Some("https://a.example"));
        assert!(ctx.subject.is_none());
    }

    #[test]
    fn test_context_mut_reuses_existing() {
        let mut req = Request::builder().uri("/x").body(Body::empty()).unwrap();
        let id = context_mut(&mut req).correlation_id;
        context_mut(&mut req).path = "/changed".into();
        let ctx = req.extensions().get::<RequestContext>().unwrap();
        assert_eq!(ctx.correlation_id, id);
        assert_eq!(ctx.path, "/changed");
    }

    #[test]
    fn test_garbled_origin_still_counts_as_present() {
        let mut req = Request::builder().uri("/").body(Body::empty()).unwrap();
        req.headers_mut().insert(
            header::ORIGIN,
            axum::http::HeaderValue::from_bytes(b"https://ev\xffil.example").unwrap(),
        );
        assert!(RequestContext::begin(&req).origin.is_some());
    }

    #[tokio::test]
    async fn test_access_records_wrap_the_request() {
        let capture = CaptureLayer::default();
        let _guard =
            tracing::subscriber::set_default(tracing_subscriber::registry().with(capture.clone()));

        let app = Router::new()
            .route(
                "/jobs",
                post(|| async { (StatusCode::CREATED, [("x-handler", "jobs")], "created") }),
            )
            .layer(from_fn(correlate));
        let response = app
            .oneshot(Request::post("/jobs?draft=1").body(Body::empty()).unwrap())
            .await
            .unwrap();

        // The response passes through untouched.
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()["x-handler"], "jobs");
        assert!(response.headers().get("x-request-id").is_none());
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"created");

        let records: Vec<Captured> = capture
            .0
            .lock()
            .unwrap()
            .drain(..)
            .filter(|r| r.target == ACCESS_LOG_TARGET)
            .collect();
        assert_eq!(records.len(), 2);
        let (entry, exit) = (&records[0].fields, &records[1].fields);

        assert_eq!(entry["message"], "request started");
        assert_eq!(exit["message"], "request completed");
        assert_eq!(entry["request_id"].len(), 36);
        assert_eq!(entry["request_id"], exit["request_id"]);
        for record in [entry, exit] {
            assert_eq!(record["method"], "POST");
            assert_eq!(record["path"], "/jobs");
            assert!(record.contains_key("timestamp"));
        }
        assert!(!entry.contains_key("status"));
        assert_eq!(exit["status"], "201");
        assert!(exit["duration_ms"].parse::<u64>().is_ok());
    }
}
