//! Cache-policy annotation.
//!
//! GET responses may be cached by the client for an hour (never by shared
//! caches); anything else is `no-store`. No branching on response status.

use axum::{
    body::Body,
    http::{header, HeaderValue, Method, Request},
    middleware::Next,
    response::Response,
};

use crate::http::request::context_mut;

/// Cache directive chosen from the request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheDirective {
    /// `private, max-age=3600`
    PrivateHour,
    /// `no-store`
    NoStore,
}

impl CacheDirective {
    pub fn for_method(method: &Method) -> Self {
        if method == Method::GET {
            CacheDirective::PrivateHour
        } else {
            CacheDirective::NoStore
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CacheDirective::PrivateHour => "private, max-age=3600",
            CacheDirective::NoStore => "no-store",
        }
    }
}

pub async fn annotate_cache_policy(mut req: Request<Body>, next: Next) -> Response {
    let directive = CacheDirective::for_method(req.method());
    context_mut(&mut req).cache_directive = Some(directive);

    let mut response = next.run(req).await;
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static(directive.as_str()));
    response
}
