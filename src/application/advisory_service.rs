// Advisory service - Double-fetch resolution of the published advisory sheet
use crate::application::source_error::SourceError;
use crate::application::telemetry_repository::AdvisoryFeed;
use crate::domain::advisory::AdvisoryPayload;
use crate::infrastructure::advisory_csv::parse_advisory_csv;
use std::sync::Arc;
use std::time::Duration;

/// Cache-buster granularity, so repeated loads within one window share a key.
const CACHE_BUSTER_WINDOW_MS: i64 = 5000;

#[derive(Clone)]
pub struct AdvisoryService {
    feed: Arc<dyn AdvisoryFeed>,
    refetch_delay: Duration,
}

impl AdvisoryService {
    pub fn new(feed: Arc<dyn AdvisoryFeed>, refetch_delay: Duration) -> Self {
        Self {
            feed,
            refetch_delay,
        }
    }

    /// Resolve the current advisory. Failures are logged and yield the empty payload.
    pub async fn fetch(&self) -> AdvisoryPayload {
        match self.try_fetch().await {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!("Advisory fetch failed: {}", e);
                AdvisoryPayload::empty()
            }
        }
    }

    /// Resolve the current advisory, surfacing upstream failures.
    ///
    /// Published sheets intermittently serve a stale cached copy, so the feed
    /// is read twice with distinct cache busters and the fresher read is kept.
    /// An unconfigured feed resolves to the empty payload without any I/O.
    pub async fn try_fetch(&self) -> Result<AdvisoryPayload, SourceError> {
        if !self.feed.is_configured() {
            tracing::warn!("Advisory feed URL is not configured; serving no advisory");
            return Ok(AdvisoryPayload::empty());
        }

        let base = chrono::Utc::now().timestamp_millis() / CACHE_BUSTER_WINDOW_MS;

        let first = parse_advisory_csv(&self.feed.fetch_document(base).await?);
        tokio::time::sleep(self.refetch_delay).await;
        let second = parse_advisory_csv(&self.feed.fetch_document(base + 1).await?);

        tracing::debug!(
            "Advisory reads: first ts {:?}, second ts {:?}",
            first.timestamp_unix_s,
            second.timestamp_unix_s
        );

        Ok(AdvisoryPayload::reconcile(first, second))
    }
}
