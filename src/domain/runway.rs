// Runway advisory engine: wind group, components, closure and override logic
use super::advisory::AdvisoryColor;
use super::live_view::MergedView;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Runway shown when the field is closed.
pub const CLOSED_RUNWAY: &str = "--";
/// Runway shown when telemetry has no recommendation.
pub const UNKNOWN_RUNWAY: &str = "—";

/// Calm threshold in knots.
const CALM_BELOW_KT: f64 = 2.0;
/// Gusts are only reported when they exceed the sustained speed by this much.
const GUST_MARGIN_KT: f64 = 2.0;

static FIELD_CLOSED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)field\s*closed|rwy\s*closed|closed|no\s*landings|do\s*not\s*land|unusable")
        .expect("field-closed pattern is valid")
});

/// One runway end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunwayEnd {
    pub id: String,
    pub heading_deg: f64,
}

impl RunwayEnd {
    pub fn new(id: impl Into<String>, heading_deg: f64) -> Self {
        Self {
            id: id.into(),
            heading_deg,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AlongLabel {
    #[serde(rename = "HW")]
    Headwind,
    #[serde(rename = "TW")]
    Tailwind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CrossSide {
    #[serde(rename = "L")]
    Left,
    #[serde(rename = "R")]
    Right,
}

/// Wind components for one runway end. Magnitudes are non-negative knots.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WindComponents {
    pub along: AlongLabel,
    pub along_kt: f64,
    pub side: CrossSide,
    pub cross_kt: f64,
}

/// Resolve the headwind/crosswind split for a runway heading.
///
/// Both direction and speed are required; a missing input yields `None`
/// rather than a misleading zero.
pub fn wind_components(
    direction_deg: Option<f64>,
    speed_kt: Option<f64>,
    heading_deg: f64,
) -> Option<WindComponents> {
    let (dir, spd) = (direction_deg?, speed_kt?);
    let delta = (dir - heading_deg).to_radians();
    let headwind = spd * delta.cos();
    let crosswind = spd * delta.sin();

    Some(WindComponents {
        along: if headwind >= 0.0 {
            AlongLabel::Headwind
        } else {
            AlongLabel::Tailwind
        },
        along_kt: headwind.abs(),
        side: if crosswind >= 0.0 {
            CrossSide::Right
        } else {
            CrossSide::Left
        },
        cross_kt: crosswind.abs(),
    })
}

/// METAR-style wind group, e.g. `09012G15KT` or `CALM`.
pub fn wind_group(direction_deg: Option<f64>, speed_kt: Option<f64>, gust_kt: Option<f64>) -> String {
    if speed_kt.is_some_and(|s| s < CALM_BELOW_KT) {
        return "CALM".to_string();
    }

    let dir = direction_deg.map_or_else(|| "///".to_string(), |d| format!("{:03}", d.round() as i64));
    let spd = speed_kt.map_or_else(|| "__".to_string(), |s| format!("{:02}", s.round() as i64));

    let gust = match (gust_kt, speed_kt) {
        (Some(g), Some(s)) if g >= s + GUST_MARGIN_KT => format!("G{:02}", g.round() as i64),
        _ => String::new(),
    };

    format!("{dir}{spd}{gust}KT")
}

/// True when free-text advisory wording indicates the field is unusable.
pub fn is_field_closed(advisory_text: Option<&str>) -> bool {
    advisory_text
        .map(str::trim)
        .is_some_and(|t| !t.is_empty() && FIELD_CLOSED.is_match(t))
}

/// Banner tier selected by advisory color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BannerTier {
    None,
    Info,
    Caution,
    Alert,
    Neutral,
}

impl BannerTier {
    fn from_advisory(text: Option<&str>, color: AdvisoryColor) -> Self {
        if text.is_none() {
            return Self::None;
        }
        match color {
            AdvisoryColor::Green => Self::Info,
            AdvisoryColor::Amber => Self::Caution,
            AdvisoryColor::Red => Self::Alert,
            AdvisoryColor::Neutral => Self::Neutral,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldState {
    Open,
    Closed,
}

/// Components for one runway end plus whether it is the active recommendation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunwayReport {
    pub id: String,
    pub heading_deg: f64,
    pub recommended: bool,
    pub components: Option<WindComponents>,
}

/// The operational decision derived from one merged view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunwayAdvisory {
    pub wind_direction_deg: Option<f64>,
    pub wind_group: String,
    pub runways: Vec<RunwayReport>,
    pub field_closed: bool,
    pub field_state: FieldState,
    pub recommended_runway: String,
    pub ops_override: bool,
    pub advisory_color: AdvisoryColor,
    pub banner: BannerTier,
}

/// Run the runway decision logic over a merged view.
pub fn evaluate(view: &MergedView, runways: &[RunwayEnd]) -> RunwayAdvisory {
    let wx = view.snapshot.as_ref();
    let direction = wx.and_then(|w| w.effective_wind_direction());
    let speed = wx.and_then(|w| w.wind_speed_kt);
    let gust = wx.and_then(|w| w.wind_gust_kt);

    let advisory_text = view.advisory_text();
    let field_closed = is_field_closed(advisory_text);

    let recommended_runway = if field_closed {
        CLOSED_RUNWAY.to_string()
    } else {
        wx.and_then(|w| w.recommended_runway.as_deref())
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map_or_else(|| UNKNOWN_RUNWAY.to_string(), str::to_uppercase)
    };

    let advisory_is_newer = match (view.advisory_ts_unix_s, view.timestamp_unix_s()) {
        (Some(adv), Some(wx_ts)) => adv > wx_ts,
        _ => false,
    };
    let ops_override = field_closed || (advisory_text.is_some() && advisory_is_newer);

    let advisory_color = view.advisory_color.unwrap_or(AdvisoryColor::Neutral);

    let runways = runways
        .iter()
        .map(|rwy| RunwayReport {
            id: rwy.id.clone(),
            heading_deg: rwy.heading_deg,
            recommended: rwy.id.eq_ignore_ascii_case(&recommended_runway),
            components: wind_components(direction, speed, rwy.heading_deg),
        })
        .collect();

    RunwayAdvisory {
        wind_direction_deg: direction,
        wind_group: wind_group(direction, speed, gust),
        runways,
        field_closed,
        field_state: if field_closed {
            FieldState::Closed
        } else {
            FieldState::Open
        },
        recommended_runway,
        ops_override,
        advisory_color,
        banner: BannerTier::from_advisory(advisory_text, advisory_color),
    }
}
