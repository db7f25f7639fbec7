use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::Router;
use axum::http::StatusCode;
use tokio::sync::broadcast;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;

use crate::api;
use crate::config::ServerConfig;
use crate::dashboard::Dashboard;

/// Per-request limit; air-quality batches are the slowest handler
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

pub fn app(dashboard: Arc<Dashboard>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/api", api::router(dashboard))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            REQUEST_TIMEOUT,
        ))
        .layer(cors)
}

/// Serve the API until shutdown is signalled
pub async fn run(
    config: &ServerConfig,
    dashboard: Arc<Dashboard>,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<()> {
    let addr = format!("{}:{}", config.bind_address, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("API server running at http://{}/api", addr);

    axum::serve(listener, app(dashboard))
        .with_graceful_shutdown(async move {
            shutdown.recv().await.ok();
        })
        .await
        .with_context(|| "API server failed")?;
    Ok(())
}
