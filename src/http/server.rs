//! HTTP server setup and pipeline assembly.
//!
//! # Responsibilities
//! - Build the admission pipeline in its fixed order
//! - Register public, credential-issuance and protected routes
//! - Register the not-found fallback last
//! - Bind the router to a listener with graceful shutdown
//!
//! # Pipeline (outermost first)
//! ```text
//! correlate → trace → negotiate_origin → annotate_cache_policy
//!     → auth_gate → role_gate → timeout → handler | not_found
//! ```
//! The gates consult the route table and pass public paths straight through.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::{GatewayConfig, ValidationError};
use crate::health::DependencyCheck;
use crate::http::handlers::{self, AppState};
use crate::http::middleware::cache_policy::annotate_cache_policy;
use crate::http::middleware::cors::{negotiate_origin, AllowedOrigins, OriginNegotiator};
use crate::http::request::correlate;
use crate::routing::{RouteTable, RouteTableError};
use crate::security::{auth_gate, role_gate, AuthGate, CredentialVerifier, JwtIssuer, JwtVerifier};

/// Failure assembling the pipeline.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Config(#[from] ValidationError),

    #[error(transparent)]
    Routes(#[from] RouteTableError),
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
    config: Arc<GatewayConfig>,
}

impl HttpServer {
    /// Server with the default verifier, route table and no dependency checks.
    pub fn new(config: Arc<GatewayConfig>) -> Result<Self, BuildError> {
        Self::builder(config).build()
    }

    pub fn builder(config: Arc<GatewayConfig>) -> HttpServerBuilder {
        HttpServerBuilder {
            config,
            verifier: None,
            routes: None,
            auth_routes: None,
            api_routes: Vec::new(),
            dependencies: Vec::new(),
        }
    }

    /// The assembled pipeline, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Serve until the shutdown signal fires, then drain.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Collaborators plugged into the pipeline.
pub struct HttpServerBuilder {
    config: Arc<GatewayConfig>,
    verifier: Option<Arc<dyn CredentialVerifier>>,
    routes: Option<RouteTable>,
    auth_routes: Option<Router>,
    api_routes: Vec<Router>,
    dependencies: Vec<Arc<dyn DependencyCheck>>,
}

impl HttpServerBuilder {
    /// Replace the default HS256 verifier.
    pub fn verifier(mut self, verifier: Arc<dyn CredentialVerifier>) -> Self {
        self.verifier = Some(verifier);
        self
    }

    /// Replace the marketplace route table.
    pub fn routes(mut self, routes: RouteTable) -> Self {
        self.routes = Some(routes);
        self
    }

    /// Credential issuance collaborator, mounted under `/auth`.
    pub fn auth_routes(mut self, router: Router) -> Self {
        self.auth_routes = Some(router);
        self
    }

    /// Extra business routes; access is decided by their paths.
    pub fn api_routes(mut self, router: Router) -> Self {
        self.api_routes.push(router);
        self
    }

    /// Dependency reported by `/healthz`.
    pub fn dependency(mut self, check: Arc<dyn DependencyCheck>) -> Self {
        self.dependencies.push(check);
        self
    }

    pub fn build(self) -> Result<HttpServer, BuildError> {
        let config = self.config;

        let secret = config
            .auth
            .jwt_secret
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or(ValidationError::ConfigurationMissing("JWT_SECRET"))?;
        let lifetime = config
            .auth
            .expiration()
            .ok_or(ValidationError::ConfigurationMissing("JWT_EXPIRATION"))?;
        let allowed = AllowedOrigins::parse(&config.cors.allowed_origins)
            .map_err(ValidationError::InvalidOrigin)?;

        let routes = Arc::new(match self.routes {
            Some(routes) => routes,
            None => RouteTable::marketplace()?,
        });
        let verifier = self
            .verifier
            .unwrap_or_else(|| Arc::new(JwtVerifier::new(secret)) as Arc<dyn CredentialVerifier>);
        let auth_routes = self.auth_routes.or_else(|| {
            config.auth.demo_mode.then(|| {
                tracing::warn!("DEMO_MODE enabled: /auth/token issues credentials on request");
                demo_auth_routes(Arc::new(JwtIssuer::new(secret, lifetime)))
            })
        });

        let state = AppState {
            service_name: Arc::from(config.server.service_name.as_str()),
            dependencies: Arc::from(self.dependencies),
        };

        let mut app: Router = Router::new()
            .route("/spinup", get(handlers::spinup))
            .route("/", get(handlers::root))
            .route("/healthz", get(handlers::healthz))
            .with_state(state);

        if let Some(auth_routes) = auth_routes {
            app = app.nest("/auth", auth_routes);
        }

        app = app
            .route("/api/me", get(handlers::whoami))
            .route("/api/client", get(handlers::client_area))
            .route("/api/client/{*rest}", get(handlers::client_area))
            .route("/api/freelancer", get(handlers::freelancer_area))
            .route("/api/freelancer/{*rest}", get(handlers::freelancer_area));
        for extra in self.api_routes {
            app = app.merge(extra);
        }

        let negotiator = Arc::new(OriginNegotiator::new(
            allowed,
            Duration::from_secs(config.cors.max_age_secs),
        ));
        let gate = AuthGate {
            verifier,
            routes: routes.clone(),
        };

        #[allow(deprecated)]
        let timeout = TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs));

        // `layer` wraps everything added before it: first call is innermost.
        let router = app
            .fallback(handlers::not_found)
            .layer(timeout)
            .layer(from_fn_with_state(routes, role_gate))
            .layer(from_fn_with_state(gate, auth_gate))
            .layer(from_fn(annotate_cache_policy))
            .layer(from_fn_with_state(negotiator, negotiate_origin))
            .layer(DefaultBodyLimit::max(config.server.max_body_bytes))
            .layer(TraceLayer::new_for_http())
            .layer(from_fn(correlate));

        Ok(HttpServer { router, config })
    }
}

fn demo_auth_routes(issuer: Arc<JwtIssuer>) -> Router {
    Router::new()
        .route("/token", post(handlers::issue_token))
        .with_state(issuer)
}
