// Merged live view: telemetry snapshot + sheet advisory
use super::advisory::{AdvisoryColor, AdvisoryPayload};
use super::telemetry::WeatherSnapshot;
use serde::Serialize;

/// The document served to clients, in both poll and push mode.
///
/// Snapshot fields are flattened in; the advisory fields are always present
/// (possibly `null`) so clients can tell "no advisory" from "old server".
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MergedView {
    #[serde(flatten)]
    pub snapshot: Option<WeatherSnapshot>,
    pub advisory: Option<String>,
    pub advisory_ts_unix_s: Option<i64>,
    pub advisory_age_s: Option<i64>,
    pub advisory_color: Option<AdvisoryColor>,
}

impl MergedView {
    pub fn sequence(&self) -> Option<i64> {
        self.snapshot.as_ref().and_then(|s| s.sequence)
    }

    pub fn timestamp_unix_s(&self) -> Option<i64> {
        self.snapshot.as_ref().and_then(|s| s.timestamp_unix_s)
    }

    /// Advisory text with surrounding whitespace removed; `None` when blank.
    pub fn advisory_text(&self) -> Option<&str> {
        self.advisory
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}

/// Combine a snapshot with the advisory as of `now_unix_s`.
pub fn merge(
    snapshot: Option<WeatherSnapshot>,
    advisory: &AdvisoryPayload,
    now_unix_s: i64,
) -> MergedView {
    let advisory_age_s = advisory
        .timestamp_unix_s
        .map(|ts| now_unix_s.saturating_sub(ts).max(0));

    MergedView {
        snapshot,
        advisory: advisory.text.clone(),
        advisory_ts_unix_s: advisory.timestamp_unix_s,
        advisory_age_s,
        advisory_color: advisory.color,
    }
}

/// Per-session advisory filter that suppresses regressions from a flaky cache.
///
/// Once an advisory carrying a timestamp is held, only a strictly newer one
/// replaces it. Reads with a missing or older timestamp are discarded.
#[derive(Debug, Clone, Default)]
pub struct StickyAdvisory {
    current: Option<AdvisoryPayload>,
}

impl StickyAdvisory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer a freshly fetched advisory; returns the one to display.
    pub fn offer(&mut self, incoming: AdvisoryPayload) -> &AdvisoryPayload {
        let held_ts = self.current.as_ref().and_then(|a| a.timestamp_unix_s);

        let accept = match (held_ts, incoming.timestamp_unix_s) {
            (None, _) => true,
            (Some(held), Some(new)) => new > held,
            (Some(_), None) => false,
        };

        if accept {
            self.current = Some(incoming);
        } else {
            tracing::debug!(
                "Discarding regressed advisory read (held ts {:?}, incoming ts {:?})",
                held_ts,
                incoming.timestamp_unix_s
            );
        }

        self.current.get_or_insert_with(AdvisoryPayload::empty)
    }
}

/// Remembers what a push connection last sent, to skip redundant frames.
#[derive(Debug, Clone, Default)]
pub struct ViewCursor {
    pushed: bool,
    last_sequence: Option<i64>,
    last_timestamp: Option<i64>,
    last_advisory: Option<String>,
}

impl ViewCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when `view` differs from the last pushed view.
    ///
    /// A present sequence or timestamp that differs counts as a change, as does
    /// any change of advisory text. The first view on a connection always counts.
    pub fn is_changed(&self, view: &MergedView) -> bool {
        if !self.pushed {
            return true;
        }

        let seq_changed = view
            .sequence()
            .is_some_and(|seq| Some(seq) != self.last_sequence);
        let ts_changed = view
            .timestamp_unix_s()
            .is_some_and(|ts| Some(ts) != self.last_timestamp);
        let advisory_changed = view.advisory != self.last_advisory;

        seq_changed || ts_changed || advisory_changed
    }

    /// Record `view` as pushed.
    pub fn advance(&mut self, view: &MergedView) {
        self.pushed = true;
        self.last_sequence = view.sequence().or(self.last_sequence);
        self.last_timestamp = view.timestamp_unix_s().or(self.last_timestamp);
        self.last_advisory = view.advisory.clone();
    }
}
