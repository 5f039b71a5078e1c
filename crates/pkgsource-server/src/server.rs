//! HTTP server wiring.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router, middleware};
use pkgsource_core::{ManifestStore, Ruleset};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

use crate::auth::{JwtVerifier, auth_middleware};
use crate::config::{AuthMode, Config};
use crate::routes;

/// Shared state handed to every handler.
#[derive(Debug)]
pub struct AppState {
    /// Server configuration.
    pub config: Config,
    /// The manifest index.
    pub store: Arc<ManifestStore>,
    /// Visibility rules, fixed for the process lifetime.
    pub ruleset: Arc<Ruleset>,
    /// Token verifier; `None` when authentication is off.
    pub verifier: Option<Arc<JwtVerifier>>,
}

impl AppState {
    /// Build state from configuration and a populated store.
    pub fn new(config: Config, store: Arc<ManifestStore>) -> Self {
        let ruleset = Arc::new(config.ruleset());
        let verifier = match config.auth.mode {
            AuthMode::None => None,
            AuthMode::Jwt => Some(Arc::new(JwtVerifier::new(config.auth.clone()))),
        };
        Self {
            config,
            store,
            ruleset,
            verifier,
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `ok`.
    pub status: String,
}

async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Build the complete router.
pub fn router(state: Arc<AppState>) -> Router {
    let auth_layer = middleware::from_fn_with_state(Arc::clone(&state), auth_middleware);

    Router::new()
        .route("/health", get(health))
        .merge(routes::public())
        .merge(routes::protected().layer(auth_layer))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server fails.
pub async fn serve(addr: SocketAddr, state: Arc<AppState>) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;

    tracing::info!(%addr, packages = state.store.package_count(), "Listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
