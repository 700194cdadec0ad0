// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc};
use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::application::advisory_service::AdvisoryService;
use crate::application::snapshot_service::SnapshotService;
use crate::application::streaming_service::LiveStreamService;
use crate::domain::board::BoardBuilder;
use crate::infrastructure::config::load_live_config;
use crate::infrastructure::loki_repository::LokiRepository;
use crate::infrastructure::sheets_repository::SheetsAdvisoryFeed;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    advisory_diagnostics, health_check, live_board, live_snapshot, live_stream,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = load_live_config()?;

    // Every upstream request is bounded; a hung source must not stall a feed loop
    let client = reqwest::Client::builder()
        .timeout(config.fetch_timeout())
        .build()?;

    // Create repositories (infrastructure layer)
    let loki = config.loki();
    if loki.is_none() {
        tracing::warn!("Loki is not configured; live endpoints will report it as unavailable");
    }
    let telemetry = Arc::new(LokiRepository::new(
        client.clone(),
        loki,
        config.loki_query().to_string(),
        config.lookback_seconds(),
    ));
    let advisory_feed = Arc::new(SheetsAdvisoryFeed::new(
        client,
        config.advisory_url().map(str::to_string),
    ));

    // Create services (application layer)
    let advisory_service = AdvisoryService::new(advisory_feed.clone(), config.refetch_delay());
    let snapshot_service = SnapshotService::new(telemetry.clone(), advisory_service.clone());
    let stream_service =
        LiveStreamService::new(telemetry, advisory_service, config.stream_settings());

    // Create application state
    let state = Arc::new(AppState {
        snapshot_service,
        stream_service,
        board_builder: BoardBuilder::new(
            config.station_name.clone(),
            config.runways.clone(),
            config.staleness(),
        ),
        advisory_feed,
        poll_interval: config.poll_interval(),
    });

    // Build router (presentation layer)
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/api/live", get(live_snapshot))
        .route("/api/live/board", get(live_board))
        .route("/api/live/sse", get(live_stream))
        .route("/api/diag", get(advisory_diagnostics))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr: SocketAddr = config.bind_addr.parse()?;
    tracing::info!(
        "Starting thomas-field-live on {} (poll {}s)",
        addr,
        config.poll_interval().as_secs()
    );

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
