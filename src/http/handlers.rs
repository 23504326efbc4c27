//! Endpoint handlers.
//!
//! Public: `/spinup`, `/`, `/healthz`, `/auth/token` (demo mode only).
//! Protected: `/api/me`, `/api/client/*`, `/api/freelancer/*`.

use std::sync::Arc;

use axum::{
    extract::State,
    http::Uri,
    Json,
};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::health::DependencyCheck;
use crate::http::response::ApiError;
use crate::security::credentials::{AuthenticatedSubject, IssuedCredential, JwtIssuer, Role};

/// Shared state for the public endpoints.
#[derive(Clone)]
pub struct AppState {
    pub service_name: Arc<str>,
    pub dependencies: Arc<[Arc<dyn DependencyCheck>]>,
}

fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Liveness probe target. No dependency checks, no state.
pub async fn spinup() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

#[derive(Debug, Serialize)]
pub struct ServiceInfo {
    pub name: String,
    pub version: &'static str,
    pub status: &'static str,
    pub timestamp: String,
}

pub async fn root(State(state): State<AppState>) -> Json<ServiceInfo> {
    Json(ServiceInfo {
        name: state.service_name.to_string(),
        version: env!("CARGO_PKG_VERSION"),
        status: "running",
        timestamp: now_iso(),
    })
}

pub async fn healthz(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    for dependency in state.dependencies.iter() {
        if let Err(e) = dependency.check() {
            tracing::error!(dependency = dependency.name(), error = %e, "Health check failed");
            return Err(ApiError::UpstreamUnavailable);
        }
    }
    Ok(Json(json!({
        "status": "ok",
        "timestamp": now_iso(),
    })))
}

/// Terminal responder for anything no route matched.
pub async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound {
        path: uri.path().to_string(),
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaResponse {
    pub message: &'static str,
    pub subject_id: String,
    pub role: Role,
}

pub async fn client_area(subject: AuthenticatedSubject) -> Json<AreaResponse> {
    Json(AreaResponse {
        message: "Client accessible",
        subject_id: subject.subject_id,
        role: subject.role,
    })
}

pub async fn freelancer_area(subject: AuthenticatedSubject) -> Json<AreaResponse> {
    Json(AreaResponse {
        message: "Freelancer accessible",
        subject_id: subject.subject_id,
        role: subject.role,
    })
}

pub async fn whoami(subject: AuthenticatedSubject) -> Json<AuthenticatedSubject> {
    Json(subject)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRequest {
    pub subject_id: String,
    pub role: Role,
}

/// Demo credential issuance, mounted only when `DEMO_MODE` is on.
pub async fn issue_token(
    State(issuer): State<Arc<JwtIssuer>>,
    Json(request): Json<TokenRequest>,
) -> Result<Json<IssuedCredential>, ApiError> {
    if request.subject_id.trim().is_empty() {
        return Err(ApiError::Unauthenticated("Subject is required"));
    }
    match issuer.issue(&request.subject_id, request.role) {
        Ok(credential) => {
            tracing::info!(subject_id = %request.subject_id, role = %request.role, "Issued demo credential");
            Ok(Json(credential))
        }
        Err(e) => {
            tracing::error!(error = %e, "Credential issuance failed");
            Err(ApiError::Unauthenticated("Credential issuance failed"))
        }
    }
}
