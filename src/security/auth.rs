//! Auth gate.
//!
//! Runs on every path the route table marks as credentialed. Extracts the
//! bearer token, verifies it, and attaches the subject to the request
//! context. Any failure short-circuits with 401; handlers never see a
//! partially authenticated request.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{FromRequestParts, State},
    http::{header, request::Parts, HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::http::request::{context_mut, RequestContext};
use crate::http::response::ApiError;
use crate::observability::metrics;
use crate::routing::RouteTable;
use crate::security::credentials::{AuthError, AuthenticatedSubject, CredentialVerifier};

/// State for the auth gate.
#[derive(Clone)]
pub struct AuthGate {
    pub verifier: Arc<dyn CredentialVerifier>,
    pub routes: Arc<RouteTable>,
}

/// Pull the token out of `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingCredential)?
        .to_str()
        .map_err(|_| AuthError::MalformedHeader)?;

    let (scheme, token) = value.split_once(' ').ok_or(AuthError::MalformedHeader)?;
    let token = token.trim();
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() || token.contains(' ') {
        return Err(AuthError::MalformedHeader);
    }
    Ok(token)
}

pub async fn auth_gate(
    State(gate): State<AuthGate>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if !gate.routes.access_for(req.uri().path()).requires_credential() {
        return next.run(req).await;
    }

    let verified = bearer_token(req.headers()).and_then(|token| gate.verifier.verify(token));
    match verified {
        Ok(subject) => {
            tracing::debug!(
                subject_id = %subject.subject_id,
                role = %subject.role,
                "Credential verified"
            );
            context_mut(&mut req).subject = Some(subject);
            next.run(req).await
        }
        Err(e) => {
            tracing::warn!(path = %req.uri().path(), reason = e.reason(), error = %e, "Authentication failed");
            metrics::record_auth_rejection(e.reason());
            ApiError::Unauthenticated(e.public_message()).into_response()
        }
    }
}

/// Handlers behind the gate take the verified subject as an extractor.
impl<S: Send + Sync> FromRequestParts<S> for AuthenticatedSubject {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestContext>()
            .and_then(|ctx| ctx.subject.clone())
            .ok_or(ApiError::Unauthenticated("Authentication required"))
    }
}
