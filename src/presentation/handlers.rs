// HTTP request handlers
use crate::application::source_error::{body_excerpt, SourceError};
use crate::infrastructure::http_response::{accepts_brotli, json_no_store_response};
use crate::infrastructure::sse::event_stream_response;
use crate::presentation::app_state::AppState;
use axum::{
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

const DIAG_SAMPLE_CHARS: usize = 300;

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

async fn respond<T: Serialize>(status: StatusCode, data: &T, compress: bool) -> Response {
    match json_no_store_response(status, data, compress).await {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}

/// Map a telemetry failure onto an explicit, renderable error document.
async fn source_failure(e: &SourceError, compress: bool) -> Response {
    if e.is_not_configured() {
        tracing::warn!("Live telemetry unavailable: {}", e);
        let body = json!({ "ok": false, "configured": false, "message": e.to_string() });
        respond(StatusCode::SERVICE_UNAVAILABLE, &body, compress).await
    } else {
        tracing::error!("Error fetching live telemetry: {}", e);
        let body = json!({ "ok": false, "error": e.to_string() });
        respond(StatusCode::BAD_GATEWAY, &body, compress).await
    }
}

/// Poll mode: the current merged view
pub async fn live_snapshot(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    let compress = accepts_brotli(&headers);
    let now = chrono::Utc::now().timestamp();

    let mut response = match state.snapshot_service.current_view(now).await {
        Ok(view) => respond(StatusCode::OK, &view, compress).await,
        Err(e) => source_failure(&e, compress).await,
    };

    response.headers_mut().insert(
        "x-poll-interval-s",
        HeaderValue::from(state.poll_interval.as_secs()),
    );
    response
}

/// The computed runway board for the current merged view
pub async fn live_board(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    let compress = accepts_brotli(&headers);
    let now = chrono::Utc::now().timestamp();

    match state.snapshot_service.current_view(now).await {
        Ok(view) => {
            let board = state.board_builder.build(&view, now);
            respond(StatusCode::OK, &board, compress).await
        }
        Err(e) => source_failure(&e, compress).await,
    }
}

/// Push mode: server-sent events until the client goes away
pub async fn live_stream(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    event_stream_response(state.stream_service.open_feed())
}

/// Probe the advisory sheet once and report what came back
pub async fn advisory_diagnostics(State(state): State<Arc<AppState>>) -> Response {
    if !state.advisory_feed.is_configured() {
        let body = json!({
            "ok": false,
            "configured": false,
            "message": "TF_ADVISORY_URL is not set on this deployment",
        });
        return respond(StatusCode::OK, &body, false).await;
    }

    let cache_buster = chrono::Utc::now().timestamp_millis();
    let body = match state.advisory_feed.fetch_document(cache_buster).await {
        Ok(text) => json!({
            "ok": true,
            "configured": true,
            "sample": body_excerpt(&text, DIAG_SAMPLE_CHARS),
        }),
        Err(e) => {
            tracing::warn!("Advisory diagnostics probe failed: {}", e);
            json!({ "ok": false, "configured": true, "error": e.to_string() })
        }
    };

    respond(StatusCode::OK, &body, false).await
}
