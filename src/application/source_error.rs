// Error type shared by the telemetry and advisory source boundaries
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    /// The source has no URL or credentials. A permanent state, not a failure.
    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    #[error("upstream returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("could not decode upstream response: {0}")]
    Decode(String),
}

impl SourceError {
    pub fn is_not_configured(&self) -> bool {
        matches!(self, Self::NotConfigured(_))
    }
}

/// Trim an upstream error body to something fit for a log line.
pub fn body_excerpt(body: &str, max_chars: usize) -> String {
    body.chars().take(max_chars).collect()
}
