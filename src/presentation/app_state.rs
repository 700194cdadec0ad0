// Application state for HTTP handlers
use crate::application::snapshot_service::SnapshotService;
use crate::application::streaming_service::LiveStreamService;
use crate::application::telemetry_repository::AdvisoryFeed;
use crate::domain::board::BoardBuilder;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct AppState {
    pub snapshot_service: SnapshotService,
    pub stream_service: LiveStreamService,
    pub board_builder: BoardBuilder,
    pub advisory_feed: Arc<dyn AdvisoryFeed>,
    pub poll_interval: Duration,
}
