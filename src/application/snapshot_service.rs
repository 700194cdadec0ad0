// Snapshot service - One merged live view per request (poll mode)
use crate::application::advisory_service::AdvisoryService;
use crate::application::source_error::SourceError;
use crate::application::telemetry_repository::TelemetrySource;
use crate::domain::live_view::{merge, MergedView};
use crate::domain::telemetry::{normalize, WeatherSnapshot};
use std::sync::Arc;

#[derive(Clone)]
pub struct SnapshotService {
    telemetry: Arc<dyn TelemetrySource>,
    advisory: AdvisoryService,
}

impl SnapshotService {
    pub fn new(telemetry: Arc<dyn TelemetrySource>, advisory: AdvisoryService) -> Self {
        Self {
            telemetry,
            advisory,
        }
    }

    /// Latest normalized snapshot; `None` if the store has no usable record.
    pub async fn latest_snapshot(&self) -> Result<Option<WeatherSnapshot>, SourceError> {
        let raw = self.telemetry.latest().await?;
        Ok(raw.as_ref().and_then(normalize))
    }

    /// Build the merged view as of `now_unix_s`.
    ///
    /// Telemetry failures are returned to the caller; advisory failures never
    /// are, they just leave the advisory fields empty.
    pub async fn current_view(&self, now_unix_s: i64) -> Result<MergedView, SourceError> {
        let snapshot = self.latest_snapshot().await?;
        let advisory = self.advisory.fetch().await;
        Ok(merge(snapshot, &advisory, now_unix_s))
    }
}
