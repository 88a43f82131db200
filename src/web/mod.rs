//! Web server module
//!
//! Minimal axum server with a liveness page and a status endpoint. The host
//! process keeps serving this even after the campaign has stopped.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::AppState;

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusResponse {
    running: bool,
    phase: crate::lifecycle::CampaignPhase,
    elapsed_days: u32,
    stop_after_days: u32,
    pool_remaining: usize,
}

async fn alive() -> &'static str {
    "Bot is alive!"
}

async fn status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let campaign = state.lifecycle.state().await;
    let pool_remaining = state.pool.lock().await.remaining();

    Json(StatusResponse {
        running: state.lifecycle.is_running(),
        phase: campaign.phase,
        elapsed_days: campaign.elapsed_days,
        stop_after_days: state.lifecycle.stop_after_days(),
        pool_remaining,
    })
}

/// Build the axum router
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(alive))
        .route("/api/status", get(status))
        .layer(cors)
        .with_state(state)
}

/// Start the web server on the given port. Blocks until shutdown.
pub async fn start_server(state: Arc<AppState>, port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let app = build_router(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    info!("Web server listening on http://0.0.0.0:{}", port);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
