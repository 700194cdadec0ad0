use crate::application::streaming_service::StreamSettings;
use crate::domain::board::StalenessThresholds;
use crate::domain::runway::RunwayEnd;
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_LOKI_QUERY: &str = r#"{job="thomas-field"} |= "\"msg\":\"wx\"" | json"#;

const MIN_POLL_SECONDS: u64 = 3;
const MIN_LOOKBACK_SECONDS: u64 = 60;

/// Process-wide settings. Read once at startup, never mutated.
///
/// Keys mirror the deployment's environment variables, lower-cased
/// (`LOKI_BASE_URL` -> `loki_base_url`), and may also come from `config/live.toml`.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LiveConfig {
    pub bind_addr: String,
    pub station_name: String,

    pub loki_base_url: Option<String>,
    pub loki_user: Option<String>,
    pub loki_token: Option<String>,
    pub loki_query: Option<String>,
    pub loki_lookback_seconds: u64,

    pub tf_advisory_url: Option<String>,
    pub advisory_sheet_csv_url: Option<String>,
    pub advisory_refresh_seconds: u64,
    pub advisory_refetch_delay_ms: u64,
    pub sticky_advisory: bool,

    pub sse_poll_seconds: u64,
    pub heartbeat_seconds: u64,
    pub fetch_timeout_seconds: u64,

    pub stale_aging_seconds: i64,
    pub stale_seconds: i64,

    pub runways: Vec<RunwayEnd>,
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            station_name: "Thomas_FLD".to_string(),
            loki_base_url: None,
            loki_user: None,
            loki_token: None,
            loki_query: None,
            loki_lookback_seconds: 600,
            tf_advisory_url: None,
            advisory_sheet_csv_url: None,
            advisory_refresh_seconds: 15,
            advisory_refetch_delay_ms: 250,
            sticky_advisory: true,
            sse_poll_seconds: 8,
            heartbeat_seconds: 25,
            fetch_timeout_seconds: 10,
            stale_aging_seconds: 120,
            stale_seconds: 300,
            runways: vec![RunwayEnd::new("09", 90.0), RunwayEnd::new("27", 270.0)],
        }
    }
}

/// Loki connection details; only present when all three are set.
#[derive(Debug, Clone, PartialEq)]
pub struct LokiSettings {
    pub base_url: String,
    pub user: String,
    pub token: String,
}

impl LiveConfig {
    pub fn loki(&self) -> Option<LokiSettings> {
        Some(LokiSettings {
            base_url: non_blank(&self.loki_base_url)?.trim_end_matches('/').to_string(),
            user: non_blank(&self.loki_user)?.to_string(),
            token: non_blank(&self.loki_token)?.to_string(),
        })
    }

    pub fn loki_query(&self) -> &str {
        non_blank(&self.loki_query).unwrap_or(DEFAULT_LOKI_QUERY)
    }

    pub fn lookback_seconds(&self) -> u64 {
        self.loki_lookback_seconds.max(MIN_LOOKBACK_SECONDS)
    }

    /// Either advisory variable works; `TF_ADVISORY_URL` wins when both are set.
    pub fn advisory_url(&self) -> Option<&str> {
        non_blank(&self.tf_advisory_url).or_else(|| non_blank(&self.advisory_sheet_csv_url))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.sse_poll_seconds.max(MIN_POLL_SECONDS))
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_seconds.max(1))
    }

    pub fn refetch_delay(&self) -> Duration {
        Duration::from_millis(self.advisory_refetch_delay_ms)
    }

    pub fn stream_settings(&self) -> StreamSettings {
        StreamSettings {
            poll_interval: self.poll_interval(),
            advisory_refresh: Duration::from_secs(self.advisory_refresh_seconds),
            heartbeat: Duration::from_secs(self.heartbeat_seconds.max(1)),
            sticky_advisory: self.sticky_advisory,
        }
    }

    pub fn staleness(&self) -> StalenessThresholds {
        StalenessThresholds {
            aging_s: self.stale_aging_seconds,
            stale_s: self.stale_seconds.max(self.stale_aging_seconds),
        }
    }
}

fn non_blank(v: &Option<String>) -> Option<&str> {
    v.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Load `config/live.toml` (optional) overlaid with the process environment.
pub fn load_live_config() -> anyhow::Result<LiveConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/live").required(false))
        .add_source(config::Environment::default().try_parsing(true))
        .build()?;

    Ok(settings.try_deserialize()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_toml(toml: &str) -> LiveConfig {
        config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_defaults() {
        let cfg = from_toml("");
        assert_eq!(cfg.poll_interval(), Duration::from_secs(8));
        assert_eq!(cfg.lookback_seconds(), 600);
        assert_eq!(cfg.loki_query(), DEFAULT_LOKI_QUERY);
        assert_eq!(cfg.staleness(), StalenessThresholds::default());
        assert_eq!(cfg.runways.len(), 2);
        assert!(cfg.loki().is_none());
        assert!(cfg.advisory_url().is_none());
        assert!(cfg.stream_settings().sticky_advisory);
    }

    #[test]
    fn test_floors() {
        let cfg = from_toml("sse_poll_seconds = 1\nloki_lookback_seconds = 5\n");
        assert_eq!(cfg.poll_interval(), Duration::from_secs(3));
        assert_eq!(cfg.lookback_seconds(), 60);
    }

    #[test]
    fn test_loki_requires_all_credentials() {
        let cfg = from_toml(
            "loki_base_url = \"https://logs.example.net/\"\nloki_user = \"123456\"\n",
        );
        assert!(cfg.loki().is_none());

        let cfg = from_toml(
            "loki_base_url = \"https://logs.example.net/\"\nloki_user = \"123456\"\nloki_token = \"glc_abc\"\n",
        );
        assert_eq!(
            cfg.loki(),
            Some(LokiSettings {
                base_url: "https://logs.example.net".to_string(),
                user: "123456".to_string(),
                token: "glc_abc".to_string(),
            })
        );
    }

    #[test]
    fn test_advisory_url_aliases() {
        let cfg = from_toml("advisory_sheet_csv_url = \"https://sheet/b\"\ntf_advisory_url = \"  \"\n");
        assert_eq!(cfg.advisory_url(), Some("https://sheet/b"));

        let cfg = from_toml("advisory_sheet_csv_url = \"https://sheet/b\"\ntf_advisory_url = \"https://sheet/a\"\n");
        assert_eq!(cfg.advisory_url(), Some("https://sheet/a"));
    }

    #[test]
    fn test_custom_runways() {
        let cfg = from_toml(
            "[[runways]]\nid = \"18\"\nheading_deg = 180.0\n\n[[runways]]\nid = \"36\"\nheading_deg = 360.0\n",
        );
        assert_eq!(cfg.runways[0], RunwayEnd::new("18", 180.0));
        assert_eq!(cfg.runways[1].id, "36");
    }
}
