// Server-sent event streaming utilities
use crate::application::streaming_service::FeedEvent;
use axum::body::Body;
use axum::http::{header, Response, StatusCode};
use axum::response::IntoResponse;
use bytes::Bytes;
use tokio::sync::mpsc;

/// Frame one event as `event: <name>\ndata: <json>\n\n`.
pub fn encode_event(event: &FeedEvent) -> Result<Bytes, serde_json::Error> {
    let data = match event {
        FeedEvent::Status(status) => serde_json::to_string(status)?,
        FeedEvent::Wx(view) => serde_json::to_string(view)?,
        FeedEvent::Ping(ping) => serde_json::to_string(ping)?,
        FeedEvent::Error(error) => serde_json::to_string(error)?,
    };
    Ok(Bytes::from(format!("event: {}\ndata: {}\n\n", event.name(), data)))
}

/// Turn a feed receiver into a streaming `text/event-stream` response.
///
/// Dropping the response body (client gone) drops the receiver, which is
/// what stops the producing loop.
pub fn event_stream_response(mut rx: mpsc::Receiver<FeedEvent>) -> impl IntoResponse {
    let stream = async_stream::stream! {
        while let Some(event) = rx.recv().await {
            match encode_event(&event) {
                Ok(frame) => yield Ok::<Bytes, std::io::Error>(frame),
                Err(e) => tracing::error!("Dropping unserializable {} event: {}", event.name(), e),
            }
        }
    };

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/event-stream; charset=utf-8")
        .header(header::CACHE_CONTROL, "no-cache, no-transform")
        .header("x-accel-buffering", "no")
        .body(Body::from_stream(stream));

    match response {
        Ok(response) => response.into_response(),
        Err(e) => {
            tracing::error!("Event stream response build error: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
