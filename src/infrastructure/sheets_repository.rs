// Published-sheet advisory feed over HTTP
use crate::application::source_error::{body_excerpt, SourceError};
use crate::application::telemetry_repository::AdvisoryFeed;
use async_trait::async_trait;
use reqwest::header::{ACCEPT, CACHE_CONTROL, USER_AGENT};

#[derive(Debug, Clone)]
pub struct SheetsAdvisoryFeed {
    client: reqwest::Client,
    url: Option<String>,
}

impl SheetsAdvisoryFeed {
    pub fn new(client: reqwest::Client, url: Option<String>) -> Self {
        Self { client, url }
    }

    fn with_cache_buster(url: &str, cache_buster: i64) -> String {
        let sep = if url.contains('?') { '&' } else { '?' };
        format!("{url}{sep}cb={cache_buster}")
    }
}

#[async_trait]
impl AdvisoryFeed for SheetsAdvisoryFeed {
    fn is_configured(&self) -> bool {
        self.url.is_some()
    }

    async fn fetch_document(&self, cache_buster: i64) -> Result<String, SourceError> {
        let url = self
            .url
            .as_deref()
            .ok_or(SourceError::NotConfigured("TF_ADVISORY_URL"))?;

        let response = self
            .client
            .get(Self::with_cache_buster(url, cache_buster))
            .header(USER_AGENT, "Mozilla/5.0")
            .header(ACCEPT, "text/csv,text/plain,*/*")
            .header(CACHE_CONTROL, "no-cache")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Http {
                status: status.as_u16(),
                body: body_excerpt(&body, 200),
            });
        }

        Ok(response.text().await?)
    }
}
