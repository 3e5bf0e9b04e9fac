//! HTTP API Server
//!
//! Starts and manages the axum-based HTTP server.

use std::net::SocketAddr;

use axum::Router;
use axum::http::HeaderValue;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use famcal_conflict::ConflictScanner;
use famcal_core::Config;

use crate::routes::routes;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub scanner: ConflictScanner,
    /// Fires on shutdown; in-flight scans stop before writing notifications
    pub shutdown: CancellationToken,
}

/// Build the application router
pub fn app(state: AppState) -> Router {
    let cors = cors_layer(state.config.api.allowed_origins.as_deref());

    Router::new()
        .merge(routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn cors_layer(allowed_origins: Option<&[String]>) -> CorsLayer {
    let Some(origins) = allowed_origins.filter(|o| !o.is_empty()) else {
        return CorsLayer::permissive();
    };

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin: {}", e);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any)
}

/// Start the HTTP API server and run until `shutdown` fires
pub async fn start_server(
    config: Config,
    scanner: ConflictScanner,
    shutdown: CancellationToken,
) -> crate::Result<()> {
    let port = config.api.port;
    let state = AppState {
        config,
        scanner,
        shutdown: shutdown.clone(),
    };

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("HTTP API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app(state))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    info!("HTTP API stopped");
    Ok(())
}
