//! Campaign Bot entry point
//!
//! Validates configuration, starts the lifecycle controller, arms the
//! campaign clock and the keep-alive probe, then serves the liveness
//! endpoint until the host is shut down. The process does not exit when the
//! campaign stops; the liveness endpoint keeps serving.
//!
//! Environment variables:
//! - `CAMPAIGN_BOT_TOKEN` - publisher bearer token
//! - `CAMPAIGN_BOT_WEB_PORT` - liveness server port (default: 8080)

use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use campaign_bot::keepalive::KeepAliveProbe;
use campaign_bot::publisher::PublishJob;
use campaign_bot::scheduler::CampaignClock;
use campaign_bot::{AppConfig, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _guard = campaign_bot::init_logging();

    info!("Starting campaign bot");
    if let Some(dir) = campaign_bot::log_dir() {
        info!("Log files saved to: {}", dir.display());
    }

    let config = AppConfig::load();

    // Configuration errors are fatal: fail here, before anything is spawned.
    let state = Arc::new(AppState::new(config).context("invalid configuration")?);

    info!(
        "Campaign configured: {} messages, stopping after {} elapsed days",
        state.pool.lock().await.remaining(),
        state.lifecycle.stop_after_days()
    );

    let _lifecycle_handle = state.lifecycle.start().await;

    let job = Arc::new(PublishJob::new(state.pool.clone(), state.publisher.clone()));
    let clock = CampaignClock::new(state.schedule.clone(), state.lifecycle.running_handle());
    let _clock_handle = clock.start(job);

    let _probe_handle = KeepAliveProbe::new(state.config.keepalive_url.clone()).start();

    // Blocks until shutdown; keeps serving after the campaign stops.
    let port = state.config.web_port;
    campaign_bot::web::start_server(state, port)
        .await
        .map_err(|e| anyhow::anyhow!("web server failed: {}", e))?;

    Ok(())
}
