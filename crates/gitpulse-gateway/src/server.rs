// SPDX-FileCopyrightText: 2026 Gitpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the query surface.

use std::sync::Arc;

use axum::{routing::get, Router};
use gitpulse_analytics::ProfileAnalytics;
use gitpulse_core::types::Commit;
use gitpulse_core::PulseError;
use gitpulse_query::QueryEngine;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;

use crate::handlers;
use crate::live;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    /// Read-side query engine.
    pub engine: Arc<QueryEngine>,
    /// Per-author analytics.
    pub profiles: Arc<ProfileAnalytics>,
    /// Broadcast of newly stored commits for the live feed.
    pub live_tx: broadcast::Sender<Commit>,
    /// Process start time for uptime reporting.
    pub start_time: std::time::Instant,
}

/// Gateway server configuration (mirrors GatewayConfig from gitpulse-config).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
}

/// Assemble the gateway router.
pub fn router(state: GatewayState) -> Router {
    Router::new()
        .route("/health", get(handlers::get_health))
        .route("/v1/commits/live", get(handlers::get_live_commits))
        .route("/v1/commits", get(handlers::get_windowed_commits))
        .route("/v1/commits/count", get(handlers::get_count))
        .route("/v1/commits/oldest", get(handlers::get_oldest))
        .route("/v1/profiles/{username}", get(handlers::get_profile))
        .route("/v1/search/authors", get(handlers::search_authors))
        .route("/v1/search/locations", get(handlers::search_locations))
        .route("/v1/regions/authors", get(handlers::get_region_authors))
        .route("/v1/regions/activity", get(handlers::get_region_activity))
        .route("/ws", get(live::ws_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the gateway HTTP/WebSocket server.
///
/// Binds to the configured host:port and serves until `shutdown` is
/// cancelled.
pub async fn start_server(
    config: &ServerConfig,
    state: GatewayState,
    shutdown: CancellationToken,
) -> Result<(), PulseError> {
    let app = router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| PulseError::Internal(format!("failed to bind gateway to {addr}: {e}")))?;

    tracing::info!("gateway listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| PulseError::Internal(format!("gateway server error: {e}")))?;

    Ok(())
}
