// Streaming service - Push-mode live feed, one cooperative loop per connection
use crate::application::advisory_service::AdvisoryService;
use crate::application::telemetry_repository::TelemetrySource;
use crate::domain::advisory::AdvisoryPayload;
use crate::domain::live_view::{merge, MergedView, StickyAdvisory, ViewCursor};
use crate::domain::telemetry::normalize;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

const CHANNEL_CAPACITY: usize = 16;

/// Timing knobs for the push loop.
#[derive(Debug, Clone, Copy)]
pub struct StreamSettings {
    pub poll_interval: Duration,
    pub advisory_refresh: Duration,
    pub heartbeat: Duration,
    pub sticky_advisory: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusPayload {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connected: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub found: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PingPayload {
    pub t: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorPayload {
    pub ok: bool,
    pub message: String,
}

/// Named events on the live feed.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    Status(StatusPayload),
    Wx(Box<MergedView>),
    Ping(PingPayload),
    Error(ErrorPayload),
}

impl FeedEvent {
    pub fn connected() -> Self {
        Self::Status(StatusPayload {
            ok: true,
            connected: Some(true),
            found: None,
        })
    }

    pub fn not_found() -> Self {
        Self::Status(StatusPayload {
            ok: true,
            connected: None,
            found: Some(false),
        })
    }

    pub fn ping(now_unix_s: i64) -> Self {
        Self::Ping(PingPayload { t: now_unix_s })
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error(ErrorPayload {
            ok: false,
            message: message.into(),
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Status(_) => "status",
            Self::Wx(_) => "wx",
            Self::Ping(_) => "ping",
            Self::Error(_) => "error",
        }
    }
}

#[derive(Clone)]
pub struct LiveStreamService {
    telemetry: Arc<dyn TelemetrySource>,
    advisory: AdvisoryService,
    settings: StreamSettings,
}

impl LiveStreamService {
    pub fn new(
        telemetry: Arc<dyn TelemetrySource>,
        advisory: AdvisoryService,
        settings: StreamSettings,
    ) -> Self {
        Self {
            telemetry,
            advisory,
            settings,
        }
    }

    /// Open a feed. The loop runs until the returned receiver is dropped.
    pub fn open_feed(&self) -> mpsc::Receiver<FeedEvent> {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let service = self.clone();

        tokio::spawn(async move {
            service.run_feed(&tx).await;
            tracing::debug!("Live feed client disconnected; loop stopped");
        });

        rx
    }

    /// Returns once the receiving side has gone away.
    async fn run_feed(&self, tx: &mpsc::Sender<FeedEvent>) {
        let mut session = FeedSession::new(self.settings.sticky_advisory);

        if tx.send(FeedEvent::connected()).await.is_err() {
            return;
        }

        let beat = self.settings.heartbeat;
        let mut heartbeat = interval_at(Instant::now() + beat, beat);
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let events = tokio::select! {
                _ = tx.closed() => return,
                events = session.cycle(self) => events,
            };

            for event in events {
                if tx.send(event).await.is_err() {
                    return;
                }
            }

            let pause = tokio::time::sleep(self.settings.poll_interval);
            tokio::pin!(pause);

            loop {
                tokio::select! {
                    _ = &mut pause => break,
                    _ = heartbeat.tick() => {
                        let now = chrono::Utc::now().timestamp();
                        if tx.send(FeedEvent::ping(now)).await.is_err() {
                            return;
                        }
                    }
                    _ = tx.closed() => return,
                }
            }
        }
    }
}

/// Mutable state owned by exactly one connection.
struct FeedSession {
    cursor: ViewCursor,
    sticky: Option<StickyAdvisory>,
    advisory: AdvisoryPayload,
    last_advisory_fetch: Option<Instant>,
}

impl FeedSession {
    fn new(sticky_advisory: bool) -> Self {
        Self {
            cursor: ViewCursor::new(),
            sticky: sticky_advisory.then(StickyAdvisory::new),
            advisory: AdvisoryPayload::empty(),
            last_advisory_fetch: None,
        }
    }

    async fn cycle(&mut self, service: &LiveStreamService) -> Vec<FeedEvent> {
        let latest = service.telemetry.latest().await;
        self.refresh_advisory(service).await;

        let raw = match latest {
            Ok(Some(raw)) => raw,
            Ok(None) => return vec![FeedEvent::not_found()],
            Err(e) => {
                tracing::warn!("Live feed telemetry fetch failed: {}", e);
                return vec![FeedEvent::error(e.to_string())];
            }
        };

        let Some(snapshot) = normalize(&raw) else {
            tracing::warn!("Discarding telemetry record that is not an object");
            return vec![FeedEvent::not_found()];
        };

        let view = merge(Some(snapshot), &self.advisory, chrono::Utc::now().timestamp());
        if !self.cursor.is_changed(&view) {
            return Vec::new();
        }

        self.cursor.advance(&view);
        vec![FeedEvent::Wx(Box::new(view))]
    }

    /// Re-read the advisory if the refresh interval has passed.
    /// A failed read keeps the last good advisory.
    async fn refresh_advisory(&mut self, service: &LiveStreamService) {
        let due = self
            .last_advisory_fetch
            .is_none_or(|at| at.elapsed() > service.settings.advisory_refresh);
        if !due {
            return;
        }
        self.last_advisory_fetch = Some(Instant::now());

        match service.advisory.try_fetch().await {
            Ok(payload) => {
                self.advisory = match self.sticky.as_mut() {
                    Some(sticky) => sticky.offer(payload).clone(),
                    None => payload,
                };
            }
            Err(e) => {
                tracing::warn!("Advisory refresh failed, keeping last known advisory: {}", e);
            }
        }
    }
}
