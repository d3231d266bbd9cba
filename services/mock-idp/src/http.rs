//! HTTP surface: token issuance, key set discovery, health and metrics.

use crate::error::TokenError;
use crate::jwks::{Jwks, JwksPublisher};
use crate::jwt::{TokenIssuer, Validity};
use crate::keys::KeyManager;
use crate::metrics;
use axum::extract::{Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Conventional JWKS discovery path.
pub const JWKS_PATH: &str = "/.well-known/jwks.json";

/// Token issuance path.
pub const AUTH_PATH: &str = "/auth";

/// Shared request state.
pub struct AppState {
    /// Key material
    pub keys: Arc<KeyManager>,
    /// Token issuer
    pub issuer: TokenIssuer,
    /// Key set publisher
    pub publisher: JwksPublisher,
}

impl AppState {
    /// Wire the issuer and publisher to one key manager.
    #[must_use]
    pub fn new(keys: Arc<KeyManager>, issuer_settings: crate::jwt::IssuerSettings) -> Self {
        Self {
            issuer: TokenIssuer::new(Arc::clone(&keys), issuer_settings),
            publisher: JwksPublisher::new(Arc::clone(&keys)),
            keys,
        }
    }
}

/// Query parameters accepted by [`AUTH_PATH`].
#[derive(Debug, Default, Deserialize)]
pub struct AuthParams {
    /// `1`, `true` or `yes` requests an already-expired token
    pub expired: Option<String>,
}

impl AuthParams {
    /// Requested validity.
    #[must_use]
    pub fn validity(&self) -> Validity {
        match self.expired.as_deref().map(str::trim) {
            Some(flag)
                if flag == "1"
                    || flag.eq_ignore_ascii_case("true")
                    || flag.eq_ignore_ascii_case("yes") =>
            {
                Validity::Expired
            }
            _ => Validity::Normal,
        }
    }
}

/// Issuance response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    /// Signed compact JWT
    pub token: String,
}

/// Health response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `ok` while serving
    pub status: String,
    /// Retained signing keys
    pub keys: usize,
}

/// Build the router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(AUTH_PATH, post(issue_token))
        .route(JWKS_PATH, get(publish_jwks))
        .route("/health", get(health))
        .route("/metrics", get(render_metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// POST /auth
async fn issue_token(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AuthParams>,
) -> Result<Json<TokenResponse>, TokenError> {
    let validity = params.validity();
    let token = state.issuer.issue(validity)?;
    info!(validity = validity.as_str(), "Token issued");
    Ok(Json(TokenResponse { token }))
}

/// GET /.well-known/jwks.json
async fn publish_jwks(State(state): State<Arc<AppState>>) -> Json<Jwks> {
    Json(state.publisher.publish())
}

/// GET /health
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        keys: state.keys.key_count(),
    })
}

/// GET /metrics
async fn render_metrics() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        metrics::render(),
    )
}
