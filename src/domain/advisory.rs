// Advisory domain model
use serde::{Deserialize, Serialize};

/// Canonical advisory banner colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdvisoryColor {
    Red,
    Amber,
    Green,
    Neutral,
}

impl AdvisoryColor {
    /// Map a free-form spelling onto a canonical color.
    ///
    /// Unrecognized spellings map to `None`, never to `Neutral`.
    pub fn canonicalize(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "red" => Some(Self::Red),
            "amber" | "yellow" => Some(Self::Amber),
            "green" => Some(Self::Green),
            "neutral" | "gray" | "grey" => Some(Self::Neutral),
            _ => None,
        }
    }
}

/// The operator-maintained advisory as published by the sheet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdvisoryPayload {
    pub text: Option<String>,
    pub timestamp_unix_s: Option<i64>,
    pub color: Option<AdvisoryColor>,
}

impl AdvisoryPayload {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Pick the more trustworthy of two reads of the same feed.
    ///
    /// The newer timestamp wins (missing counts as -1). On a tie the longer
    /// text wins, otherwise the first read is kept.
    pub fn reconcile(first: Self, second: Self) -> Self {
        let first_ts = first.timestamp_unix_s.unwrap_or(-1);
        let second_ts = second.timestamp_unix_s.unwrap_or(-1);

        if second_ts > first_ts {
            return second;
        }
        if first_ts > second_ts {
            return first;
        }

        if second.text_len() > first.text_len() {
            second
        } else {
            first
        }
    }

    fn text_len(&self) -> usize {
        self.text.as_deref().map_or(0, |t| t.chars().count())
    }
}
