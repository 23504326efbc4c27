//! Bearer credential verification and issuance.
//!
//! Verification is a pluggable capability: the auth gate only sees
//! `CredentialVerifier::verify(token) -> AuthenticatedSubject | AuthError`.
//! The default implementation checks HS256 JWTs against the shared secret.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Marketplace role carried in a credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum Role {
    Client,
    Freelancer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Client => "client",
            Role::Freelancer => "freelancer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "client" => Ok(Role::Client),
            "freelancer" => Ok(Role::Freelancer),
            other => Err(AuthError::UnknownRole(other.to_string())),
        }
    }
}

/// Identity derived from a verified credential. Read-only downstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatedSubject {
    pub subject_id: String,
    pub role: Role,
}

/// Why a credential was refused. Logged, never returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("missing Authorization header")]
    MissingCredential,

    #[error("Authorization header is not a bearer credential")]
    MalformedHeader,

    #[error("credential expired")]
    Expired,

    #[error("credential rejected: {0}")]
    Invalid(String),

    #[error("credential carries no subject")]
    MissingSubject,

    #[error("unknown role {0:?}")]
    UnknownRole(String),
}

impl AuthError {
    /// Generic text safe to show the caller.
    pub fn public_message(&self) -> &'static str {
        match self {
            AuthError::MissingCredential | AuthError::MalformedHeader => "Authentication required",
            _ => "Invalid or expired credential",
        }
    }

    /// Low-cardinality label for metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            AuthError::MissingCredential => "missing",
            AuthError::MalformedHeader => "malformed",
            AuthError::Expired => "expired",
            AuthError::Invalid(_) => "invalid",
            AuthError::MissingSubject => "no_subject",
            AuthError::UnknownRole(_) => "unknown_role",
        }
    }
}

/// Verifies a raw bearer token.
pub trait CredentialVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Result<AuthenticatedSubject, AuthError>;
}

/// Wire claims. `userId` is accepted as an alias for `sub`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    #[serde(default, rename = "userId", skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub role: String,
    pub exp: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<u64>,
}

/// HS256 verifier over the shared secret.
pub struct JwtVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }
}

impl CredentialVerifier for JwtVerifier {
    fn verify(&self, token: &str) -> Result<AuthenticatedSubject, AuthError> {
        let data = jsonwebtoken::decode::<Claims>(token, &self.key, &self.validation).map_err(
            |e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => AuthError::Invalid(e.to_string()),
            },
        )?;

        let claims = data.claims;
        let subject_id = claims
            .sub
            .or(claims.user_id)
            .filter(|s| !s.is_empty())
            .ok_or(AuthError::MissingSubject)?;
        let role = claims.role.parse()?;

        Ok(AuthenticatedSubject { subject_id, role })
    }
}

/// A freshly minted credential.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedCredential {
    pub token: String,
    pub expires_in: u64,
}

/// Mints credentials the `JwtVerifier` with the same secret accepts.
pub struct JwtIssuer {
    key: EncodingKey,
    lifetime: Duration,
}

impl JwtIssuer {
    pub fn new(secret: &str, lifetime: Duration) -> Self {
        Self {
            key: EncodingKey::from_secret(secret.as_bytes()),
            lifetime,
        }
    }

    pub fn issue(&self, subject_id: &str, role: Role) -> Result<IssuedCredential, AuthError> {
        let now = Utc::now().timestamp().max(0) as u64;
        let claims = Claims {
            sub: Some(subject_id.to_string()),
            user_id: None,
            role: role.as_str().to_string(),
            exp: now.saturating_add(self.lifetime.as_secs()),
            iat: Some(now),
        };
        let token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.key)
            .map_err(|e| AuthError::Invalid(e.to_string()))?;
        Ok(IssuedCredential {
            token,
            expires_in: self.lifetime.as_secs(),
        })
    }
}
