//! Role gate.
//!
//! Runs after the auth gate. For role-restricted paths the subject's role
//! must equal the required role exactly; there is no hierarchy between roles.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::http::request::RequestContext;
use crate::http::response::ApiError;
use crate::observability::metrics;
use crate::routing::RouteTable;
use crate::security::credentials::{AuthenticatedSubject, Role};

/// Pass/fail decision for a subject against a requirement.
pub fn authorize(subject: &AuthenticatedSubject, required: Role) -> Result<(), ApiError> {
    if subject.role == required {
        Ok(())
    } else {
        Err(ApiError::Forbidden)
    }
}

pub async fn role_gate(
    State(routes): State<Arc<RouteTable>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let Some(required) = routes.access_for(req.uri().path()).required_role() else {
        return next.run(req).await;
    };

    let subject = req
        .extensions()
        .get::<RequestContext>()
        .and_then(|ctx| ctx.subject.as_ref());

    match subject {
        Some(subject) => match authorize(subject, required) {
            Ok(()) => next.run(req).await,
            Err(e) => {
                tracing::warn!(
                    subject_id = %subject.subject_id,
                    role = %subject.role,
                    required = %required,
                    path = %req.uri().path(),
                    "Role mismatch"
                );
                metrics::record_auth_rejection("forbidden");
                e.into_response()
            }
        },
        None => {
            // Only reachable if the gates were layered in the wrong order.
            tracing::error!(path = %req.uri().path(), "Role gate reached without a verified subject");
            ApiError::Unauthenticated("Authentication required").into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roles_do_not_cross() {
        let client = AuthenticatedSubject {
            subject_id: "c".into(),
            role: Role::Client,
        };
        let freelancer = AuthenticatedSubject {
            subject_id: "f".into(),
            role: Role::Freelancer,
        };
        assert_eq!(authorize(&client, Role::Client), Ok(()));
        assert_eq!(authorize(&freelancer, Role::Freelancer), Ok(()));
        assert_eq!(authorize(&freelancer, Role::Client), Err(ApiError::Forbidden));
        assert_eq!(authorize(&client, Role::Freelancer), Err(ApiError::Forbidden));
    }
}
