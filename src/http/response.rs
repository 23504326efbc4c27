//! Error responses.
//!
//! # Design Decisions
//! - One taxonomy for every failure a caller can observe
//! - Bodies are `{status: "error", ...}` JSON
//! - Internal detail (verification failures, dependency errors) is logged by
//!   the stage that saw it and never rendered here

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Failures surfaced to API callers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// Missing, malformed, invalid or expired credential.
    #[error("unauthenticated: {0}")]
    Unauthenticated(&'static str),

    /// Authenticated, but the role does not match the route.
    #[error("forbidden")]
    Forbidden,

    /// Nothing matched the path.
    #[error("route not found: {path}")]
    NotFound { path: String },

    /// A dependency check failed.
    #[error("upstream unavailable")]
    UpstreamUnavailable,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::UpstreamUnavailable => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ApiError::Unauthenticated(message) => json!({
                "status": "error",
                "message": message,
            }),
            ApiError::Forbidden => json!({
                "status": "error",
                "message": "Insufficient permissions",
            }),
            ApiError::NotFound { path } => json!({
                "status": "error",
                "message": "Route not found",
                "path": path,
            }),
            ApiError::UpstreamUnavailable => json!({
                "status": "error",
                "error": "Health check failed",
            }),
        };

        let mut response = (status, Json(body)).into_response();
        if matches!(self, ApiError::Unauthenticated(_)) {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::Unauthenticated("x").status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            ApiError::NotFound { path: "/a".into() }.status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::UpstreamUnavailable.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_unauthenticated_challenges_bearer() {
        let response = ApiError::Unauthenticated("Authentication required").into_response();
        assert_eq!(response.headers()[header::WWW_AUTHENTICATE], "Bearer");
    }
}
