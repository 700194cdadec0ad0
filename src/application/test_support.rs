// In-memory sources for service tests
use crate::application::source_error::SourceError;
use crate::application::telemetry_repository::{AdvisoryFeed, TelemetrySource};
use crate::domain::telemetry::RawTelemetry;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// One scripted telemetry response.
#[derive(Debug, Clone)]
pub enum Step {
    Record(Value),
    Empty,
    Fail,
    Unconfigured,
}

type StepFn = Box<dyn Fn(usize) -> Step + Send + Sync>;

/// Telemetry source driven by a script; call `n` (0-based) gets `script(n)`.
pub struct ScriptedTelemetry {
    script: StepFn,
    calls: AtomicUsize,
}

impl ScriptedTelemetry {
    /// Plays `steps` in order, then repeats the last one forever.
    pub fn new(steps: Vec<Step>) -> Self {
        Self::from_fn(move |n| {
            steps
                .get(n)
                .or_else(|| steps.last())
                .cloned()
                .unwrap_or(Step::Empty)
        })
    }

    pub fn from_fn(script: impl Fn(usize) -> Step + Send + Sync + 'static) -> Self {
        Self {
            script: Box::new(script),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TelemetrySource for ScriptedTelemetry {
    async fn latest(&self) -> Result<Option<RawTelemetry>, SourceError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        match (self.script)(n) {
            Step::Record(v) => Ok(Some(RawTelemetry::new(v))),
            Step::Empty => Ok(None),
            Step::Fail => Err(SourceError::Http {
                status: 502,
                body: "bad gateway".to_string(),
            }),
            Step::Unconfigured => Err(SourceError::NotConfigured("LOKI_BASE_URL")),
        }
    }
}

/// Advisory feed that plays back documents; `None` entries fail with HTTP 503.
pub struct ScriptedFeed {
    configured: bool,
    documents: Vec<Option<String>>,
    calls: AtomicUsize,
    cache_busters: Mutex<Vec<i64>>,
}

impl ScriptedFeed {
    pub fn new(documents: Vec<Option<&str>>) -> Self {
        Self {
            configured: true,
            documents: documents
                .into_iter()
                .map(|d| d.map(str::to_string))
                .collect(),
            calls: AtomicUsize::new(0),
            cache_busters: Mutex::new(Vec::new()),
        }
    }

    pub fn unconfigured() -> Self {
        Self {
            configured: false,
            ..Self::new(Vec::new())
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn cache_busters(&self) -> Vec<i64> {
        self.cache_busters.lock().unwrap().clone()
    }
}

#[async_trait]
impl AdvisoryFeed for ScriptedFeed {
    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn fetch_document(&self, cache_buster: i64) -> Result<String, SourceError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        self.cache_busters.lock().unwrap().push(cache_buster);

        match self.documents.get(n).or_else(|| self.documents.last()) {
            Some(Some(doc)) => Ok(doc.clone()),
            _ => Err(SourceError::Http {
                status: 503,
                body: "sheet unavailable".to_string(),
            }),
        }
    }
}
