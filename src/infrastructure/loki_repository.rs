// Loki repository implementation - newest station record from the log store
use crate::application::source_error::{body_excerpt, SourceError};
use crate::application::telemetry_repository::TelemetrySource;
use crate::domain::telemetry::RawTelemetry;
use crate::infrastructure::config::LokiSettings;
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use serde::Deserialize;

const NANOS_PER_SECOND: i64 = 1_000_000_000;

#[derive(Debug, Clone)]
pub struct LokiRepository {
    client: reqwest::Client,
    settings: Option<LokiSettings>,
    query: String,
    lookback_seconds: u64,
}

#[derive(Debug, Deserialize)]
struct QueryRangeResponse {
    #[serde(default)]
    data: Option<QueryRangeData>,
}

#[derive(Debug, Deserialize)]
struct QueryRangeData {
    #[serde(default)]
    result: Vec<LogStream>,
}

#[derive(Debug, Deserialize)]
struct LogStream {
    /// `[timestamp_ns, line]` pairs, newest first for a backward query
    #[serde(default)]
    values: Vec<(String, String)>,
}

impl LokiRepository {
    pub fn new(
        client: reqwest::Client,
        settings: Option<LokiSettings>,
        query: String,
        lookback_seconds: u64,
    ) -> Self {
        Self {
            client,
            settings,
            query,
            lookback_seconds,
        }
    }

    fn build_query_url(&self, base_url: &str, end_ns: i64) -> String {
        let lookback_ns = i64::try_from(self.lookback_seconds)
            .unwrap_or(i64::MAX / NANOS_PER_SECOND)
            .saturating_mul(NANOS_PER_SECOND);
        let start_ns = end_ns.saturating_sub(lookback_ns);

        format!(
            "{}/loki/api/v1/query_range?query={}&direction=backward&limit=1&start={}&end={}",
            base_url,
            urlencoding::encode(&self.query),
            start_ns,
            end_ns
        )
    }

    /// Pull the newest log line and parse it as a station record.
    fn latest_record(response: QueryRangeResponse) -> Option<RawTelemetry> {
        let line = response
            .data?
            .result
            .into_iter()
            .next()?
            .values
            .into_iter()
            .next()?
            .1;

        match serde_json::from_str(&line) {
            Ok(value) => Some(RawTelemetry::new(value)),
            Err(e) => {
                tracing::warn!("Newest Loki line is not JSON ({}); treating as no data", e);
                None
            }
        }
    }
}

#[async_trait]
impl TelemetrySource for LokiRepository {
    async fn latest(&self) -> Result<Option<RawTelemetry>, SourceError> {
        let settings = self
            .settings
            .as_ref()
            .ok_or(SourceError::NotConfigured("LOKI_BASE_URL / LOKI_USER / LOKI_TOKEN"))?;

        let now = chrono::Utc::now();
        let end_ns = now
            .timestamp_nanos_opt()
            .unwrap_or_else(|| now.timestamp_millis().saturating_mul(1_000_000));
        let url = self.build_query_url(&settings.base_url, end_ns);

        tracing::debug!("Querying Loki for the latest wx record");
        let response = self
            .client
            .get(&url)
            .basic_auth(&settings.user, Some(&settings.token))
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Http {
                status,
                body: body_excerpt(&body, 200),
            });
        }

        let data = response
            .json::<QueryRangeResponse>()
            .await
            .map_err(|e| SourceError::Decode(e.to_string()))?;

        Ok(Self::latest_record(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::config::DEFAULT_LOKI_QUERY;
    use serde_json::json;

    fn repository(settings: Option<LokiSettings>) -> LokiRepository {
        LokiRepository::new(
            reqwest::Client::new(),
            settings,
            DEFAULT_LOKI_QUERY.to_string(),
            600,
        )
    }

    fn response(body: serde_json::Value) -> QueryRangeResponse {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn test_build_query_url() {
        let url = repository(None).build_query_url("https://logs.example.net", 1_000 * NANOS_PER_SECOND);
        assert_eq!(
            url,
            "https://logs.example.net/loki/api/v1/query_range?query=%7Bjob%3D%22thomas-field%22%7D%20%7C%3D%20%22%5C%22msg%5C%22%3A%5C%22wx%5C%22%22%20%7C%20json&direction=backward&limit=1&start=400000000000&end=1000000000000"
        );
    }

    #[test]
    fn test_latest_record_parses_newest_line() {
        let body = json!({
            "status": "success",
            "data": {
                "resultType": "streams",
                "result": [{
                    "stream": { "job": "thomas-field" },
                    "values": [
                        ["1700000000000000000", "{\"msg\":\"wx\",\"msg_seq\":9}"],
                        ["1699999990000000000", "{\"msg\":\"wx\",\"msg_seq\":8}"]
                    ]
                }]
            }
        });

        let raw = LokiRepository::latest_record(response(body)).unwrap();
        assert_eq!(raw.0["msg_seq"], 9);
    }

    #[test]
    fn test_latest_record_handles_empty_and_garbage() {
        assert!(LokiRepository::latest_record(response(json!({ "data": { "result": [] } }))).is_none());
        assert!(LokiRepository::latest_record(response(json!({}))).is_none());

        let garbage = json!({ "data": { "result": [{ "values": [["1", "wx seq=9"]] }] } });
        assert!(LokiRepository::latest_record(response(garbage)).is_none());
    }

    #[tokio::test]
    async fn test_unconfigured_is_reported() {
        let err = repository(None).latest().await.unwrap_err();
        assert!(err.is_not_configured());
    }
}
