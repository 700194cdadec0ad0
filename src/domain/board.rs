// Runway board: the full operational picture handed to the dashboard
use super::live_view::MergedView;
use super::runway::{self, RunwayAdvisory, RunwayEnd};
use super::telemetry::WeatherSnapshot;
use chrono::{DateTime, Timelike};
use serde::Serialize;

const MISSING: &str = "—";

/// Age thresholds for telemetry freshness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StalenessThresholds {
    pub aging_s: i64,
    pub stale_s: i64,
}

impl Default for StalenessThresholds {
    fn default() -> Self {
        Self {
            aging_s: 120,
            stale_s: 300,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Freshness {
    Unknown,
    Updated,
    Old,
    Stale,
}

impl Freshness {
    pub fn classify(age_s: Option<i64>, thresholds: StalenessThresholds) -> Self {
        match age_s {
            None => Self::Unknown,
            Some(age) if age >= thresholds.stale_s => Self::Stale,
            Some(age) if age >= thresholds.aging_s => Self::Old,
            Some(_) => Self::Updated,
        }
    }
}

/// Everything the live page shows, computed server-side.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunwayBoard {
    pub top_line: String,
    pub wind_speed_kt: Option<f64>,
    pub wind_gust_kt: Option<f64>,
    pub wind_variability_deg: Option<f64>,
    pub wind_variable: bool,
    #[serde(flatten)]
    pub advice: RunwayAdvisory,
    pub advisory: Option<String>,
    pub advisory_age: Option<String>,
    pub telemetry_age_s: Option<i64>,
    pub freshness: Freshness,
    pub gps_line: String,
}

/// Builds boards for one station; holds only read-only settings.
#[derive(Debug, Clone)]
pub struct BoardBuilder {
    station: String,
    runways: Vec<RunwayEnd>,
    thresholds: StalenessThresholds,
}

impl BoardBuilder {
    pub fn new(station: String, runways: Vec<RunwayEnd>, thresholds: StalenessThresholds) -> Self {
        Self {
            station,
            runways,
            thresholds,
        }
    }

    pub fn build(&self, view: &MergedView, now_unix_s: i64) -> RunwayBoard {
        let wx = view.snapshot.as_ref();
        let advice = runway::evaluate(view, &self.runways);

        let telemetry_age_s = view
            .timestamp_unix_s()
            .map(|ts| now_unix_s.saturating_sub(ts).max(0));

        RunwayBoard {
            top_line: top_line(&self.station, wx, &advice.wind_group),
            wind_speed_kt: wx.and_then(|w| w.wind_speed_kt),
            wind_gust_kt: wx.and_then(|w| w.wind_gust_kt),
            wind_variability_deg: wx.and_then(|w| w.wind_direction_spread_deg),
            wind_variable: wx
                .and_then(|w| w.wind_direction_variable)
                .is_some_and(|v| v != 0),
            advice,
            advisory: view.advisory_text().map(str::to_string),
            advisory_age: view.advisory_age_s.map(format_age),
            telemetry_age_s,
            freshness: Freshness::classify(telemetry_age_s, self.thresholds),
            gps_line: gps_line(wx),
        }
    }
}

/// METAR-like summary, e.g.
/// `Thomas_FLD 0616Z 09508G11KT  CB 4300ftAGL  TEMP 22.4F  DP 3.4F  A2998  DA 9775ft`.
pub fn top_line(station: &str, wx: Option<&WeatherSnapshot>, wind_group: &str) -> String {
    let zulu = wx
        .and_then(|w| w.timestamp_unix_s)
        .filter(|ts| *ts != 0)
        .and_then(zulu_time)
        .unwrap_or_else(|| "----Z".to_string());

    let cloud_base = match wx.and_then(|w| w.cloud_base_agl_ft) {
        Some(cb) => format!("CB {}ftAGL", ((cb / 100.0).round() * 100.0).max(0.0) as i64),
        None => "CB ---".to_string(),
    };

    let temp = one_decimal(wx.and_then(|w| w.temperature_f));
    let dewpoint = one_decimal(wx.and_then(|w| w.dewpoint_f));

    let altimeter = match wx.and_then(|w| w.altimeter_inhg) {
        Some(a) => format!("A{:04}", (a * 100.0).round() as i64),
        None => "A----".to_string(),
    };

    let density_altitude = wx
        .and_then(|w| w.density_altitude_ft)
        .map_or_else(|| MISSING.to_string(), |da| format!("{}ft", da.round() as i64));

    format!(
        "{station} {zulu} {wind_group}  {cloud_base}  TEMP {temp}F  DP {dewpoint}F  {altimeter}  DA {density_altitude}"
    )
}

fn zulu_time(ts_unix_s: i64) -> Option<String> {
    let t = DateTime::from_timestamp(ts_unix_s, 0)?;
    Some(format!("{:02}{:02}Z", t.hour(), t.minute()))
}

fn one_decimal(v: Option<f64>) -> String {
    v.map_or_else(|| MISSING.to_string(), |n| format!("{n:.1}"))
}

/// Human age, e.g. `42s old`, `3:07 old`, `2h 5m old`.
pub fn format_age(age_s: i64) -> String {
    let age_s = age_s.max(0);
    if age_s < 60 {
        return format!("{age_s}s old");
    }
    let minutes = age_s / 60;
    let seconds = age_s % 60;
    if minutes < 60 {
        return format!("{minutes}:{seconds:02} old");
    }
    format!("{}h {}m old", minutes / 60, minutes % 60)
}

pub fn gps_line(wx: Option<&WeatherSnapshot>) -> String {
    let fix = wx.and_then(|w| w.gps_fix);
    let mut parts = vec![match fix {
        None => format!("GPS: {MISSING}"),
        Some(f) if f > 0 => "GPS: FIX".to_string(),
        Some(_) => "GPS: NO FIX".to_string(),
    }];

    if let (Some(lat), Some(lon)) = (wx.and_then(|w| w.latitude), wx.and_then(|w| w.longitude)) {
        parts.push(format!("{lat:.5}, {lon:.5}"));
    }
    if let Some(sats) = wx.and_then(|w| w.satellite_count) {
        parts.push(format!("{sats} sats"));
    }

    parts.join(" • ")
}
