// Repository traits for the two upstream sources
use crate::application::source_error::SourceError;
use crate::domain::telemetry::RawTelemetry;
use async_trait::async_trait;

#[async_trait]
pub trait TelemetrySource: Send + Sync {
    /// Most recent raw station record, or `None` when the lookback window is empty
    async fn latest(&self) -> Result<Option<RawTelemetry>, SourceError>;
}

#[async_trait]
pub trait AdvisoryFeed: Send + Sync {
    /// Whether a feed URL is configured at all
    fn is_configured(&self) -> bool;

    /// Fetch the raw advisory document, defeating caches with `cache_buster`
    async fn fetch_document(&self, cache_buster: i64) -> Result<String, SourceError>;
}
