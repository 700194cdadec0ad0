// Telemetry domain models and the raw -> typed normalization boundary
use serde::Serialize;
use serde_json::{Map, Value};

/// A raw telemetry record as it arrives from the log store.
///
/// Nothing about its shape is trusted: any field may be missing, a number,
/// a numeric string, or garbage.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTelemetry(pub Value);

impl RawTelemetry {
    pub fn new(value: Value) -> Self {
        Self(value)
    }
}

/// Normalized weather station snapshot.
///
/// Field names on the wire match the station's log keys, so a serialized
/// snapshot reads like the record it came from minus the junk.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WeatherSnapshot {
    #[serde(rename = "msg", skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(rename = "msg_seq", skip_serializing_if = "Option::is_none")]
    pub sequence: Option<i64>,
    #[serde(rename = "ts_unix_s", skip_serializing_if = "Option::is_none")]
    pub timestamp_unix_s: Option<i64>,

    #[serde(rename = "wind_dir_deg", skip_serializing_if = "Option::is_none")]
    pub wind_direction_deg: Option<f64>,
    #[serde(rename = "wind_dir_avg_deg", skip_serializing_if = "Option::is_none")]
    pub wind_direction_avg_deg: Option<f64>,
    #[serde(rename = "wind_dir_gust_deg", skip_serializing_if = "Option::is_none")]
    pub wind_direction_gust_deg: Option<f64>,
    #[serde(rename = "wind_dir_spread_deg", skip_serializing_if = "Option::is_none")]
    pub wind_direction_spread_deg: Option<f64>,
    #[serde(rename = "wind_dir_variable", skip_serializing_if = "Option::is_none")]
    pub wind_direction_variable: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub wind_speed_kt: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wind_gust_kt: Option<f64>,

    #[serde(rename = "temp_f", skip_serializing_if = "Option::is_none")]
    pub temperature_f: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dewpoint_f: Option<f64>,
    #[serde(rename = "rh_pct", skip_serializing_if = "Option::is_none")]
    pub relative_humidity_pct: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub altimeter_inhg: Option<f64>,
    #[serde(rename = "da_ft", skip_serializing_if = "Option::is_none")]
    pub density_altitude_ft: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cloud_base_agl_ft: Option<f64>,

    #[serde(rename = "hw_09", skip_serializing_if = "Option::is_none")]
    pub headwind_09: Option<f64>,
    #[serde(rename = "xw_09", skip_serializing_if = "Option::is_none")]
    pub crosswind_09: Option<f64>,
    #[serde(rename = "hw_27", skip_serializing_if = "Option::is_none")]
    pub headwind_27: Option<f64>,
    #[serde(rename = "xw_27", skip_serializing_if = "Option::is_none")]
    pub crosswind_27: Option<f64>,

    #[serde(rename = "rec_rwy", skip_serializing_if = "Option::is_none")]
    pub recommended_runway: Option<String>,
    #[serde(rename = "rec_reason", skip_serializing_if = "Option::is_none")]
    pub recommendation_reason: Option<String>,
    /// Legacy advisory text carried inside the telemetry record itself.
    /// Serialized under its own key so it never collides with the sheet advisory.
    #[serde(rename = "wx_advisory", skip_serializing_if = "Option::is_none")]
    pub raw_advisory_text: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub uptime_ms: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rssi: Option<i64>,

    #[serde(rename = "gps_fix", skip_serializing_if = "Option::is_none")]
    pub gps_fix: Option<i64>,
    #[serde(rename = "gps_lat", skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(rename = "gps_lon", skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(rename = "gps_alt_m", skip_serializing_if = "Option::is_none")]
    pub gps_altitude_m: Option<f64>,
    #[serde(rename = "gps_sats", skip_serializing_if = "Option::is_none")]
    pub satellite_count: Option<i64>,
    #[serde(rename = "gps_hdop", skip_serializing_if = "Option::is_none")]
    pub hdop: Option<f64>,
}

impl WeatherSnapshot {
    /// First available wind direction: instantaneous, then average, then gust.
    pub fn effective_wind_direction(&self) -> Option<f64> {
        self.wind_direction_deg
            .or(self.wind_direction_avg_deg)
            .or(self.wind_direction_gust_deg)
    }
}

/// Reduce an angle into `[0, 360)` using floored modulo.
pub fn normalize360(deg: f64) -> f64 {
    let v = deg.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if v >= 360.0 { 0.0 } else { v }
}

/// Normalize a raw record into a typed snapshot.
///
/// Returns `None` only when the record is not a JSON object. Individual
/// fields that fail to parse are dropped without affecting their siblings.
pub fn normalize(raw: &RawTelemetry) -> Option<WeatherSnapshot> {
    let obj = raw.0.as_object()?;

    Some(WeatherSnapshot {
        message: text(obj, "msg"),
        sequence: int(obj, "msg_seq"),
        timestamp_unix_s: int(obj, "ts_unix_s"),

        wind_direction_deg: num(obj, "wind_dir_deg").map(normalize360),
        wind_direction_avg_deg: num(obj, "wind_dir_avg_deg").map(normalize360),
        wind_direction_gust_deg: num(obj, "wind_dir_gust_deg").map(normalize360),
        wind_direction_spread_deg: num(obj, "wind_dir_spread_deg"),
        wind_direction_variable: int(obj, "wind_dir_variable"),

        wind_speed_kt: num(obj, "wind_speed_kt"),
        wind_gust_kt: num(obj, "wind_gust_kt"),

        temperature_f: num(obj, "temp_f"),
        dewpoint_f: num(obj, "dewpoint_f"),
        relative_humidity_pct: num(obj, "rh_pct"),

        altimeter_inhg: num(obj, "altimeter_inhg"),
        density_altitude_ft: num(obj, "da_ft"),
        cloud_base_agl_ft: num(obj, "cloud_base_agl_ft"),

        headwind_09: num(obj, "hw_09"),
        crosswind_09: num(obj, "xw_09"),
        headwind_27: num(obj, "hw_27"),
        crosswind_27: num(obj, "xw_27"),

        recommended_runway: text(obj, "rec_rwy"),
        recommendation_reason: text(obj, "rec_reason"),
        raw_advisory_text: text(obj, "advisory"),

        uptime_ms: num(obj, "uptime_ms"),
        ip: text(obj, "ip"),
        rssi: int(obj, "rssi"),

        gps_fix: int(obj, "gps_fix"),
        latitude: num(obj, "gps_lat"),
        longitude: num(obj, "gps_lon"),
        gps_altitude_m: num(obj, "gps_alt_m"),
        satellite_count: int(obj, "gps_sats"),
        hdop: num(obj, "gps_hdop"),
    })
}

/// Coerce a JSON value into a finite number.
pub fn coerce_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return None;
            }
            s.parse::<f64>().ok()?
        }
        _ => return None,
    };
    n.is_finite().then_some(n)
}

fn num(obj: &Map<String, Value>, key: &str) -> Option<f64> {
    obj.get(key).and_then(coerce_number)
}

fn int(obj: &Map<String, Value>, key: &str) -> Option<i64> {
    num(obj, key).map(|n| n.round() as i64)
}

fn text(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key).and_then(Value::as_str).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize360() {
        assert_eq!(normalize360(-10.0), 350.0);
        assert_eq!(normalize360(725.0), 5.0);
        assert_eq!(normalize360(360.0), 0.0);
        assert_eq!(normalize360(0.0), 0.0);

        for x in [-1080.5, -359.9, -0.25, 12.0, 359.99, 1e6, -1e-12] {
            let v = normalize360(x);
            assert!((0.0..360.0).contains(&v), "{x} -> {v}");
            let k = (x - v) / 360.0;
            assert!((k - k.round()).abs() < 1e-9, "{x} not congruent to {v}");
        }
    }

    #[test]
    fn test_normalize_rejects_non_objects() {
        assert!(normalize(&RawTelemetry::new(Value::Null)).is_none());
        assert!(normalize(&RawTelemetry::new(json!([1, 2, 3]))).is_none());
        assert!(normalize(&RawTelemetry::new(json!("wx"))).is_none());
    }

    #[test]
    fn test_normalize_coerces_fields() {
        let raw = RawTelemetry::new(json!({
            "msg": "wx",
            "msg_seq": "41.6",
            "ts_unix_s": 1700000000,
            "wind_dir_deg": "-10",
            "wind_dir_avg_deg": 725,
            "wind_speed_kt": " 8.5 ",
            "wind_gust_kt": "gusty",
            "temp_f": "NaN",
            "dewpoint_f": "",
            "rh_pct": true,
            "rec_rwy": "09",
            "rec_reason": 12,
            "gps_sats": 7.4,
        }));

        let wx = normalize(&raw).unwrap();
        assert_eq!(wx.message.as_deref(), Some("wx"));
        assert_eq!(wx.sequence, Some(42));
        assert_eq!(wx.timestamp_unix_s, Some(1_700_000_000));
        assert_eq!(wx.wind_direction_deg, Some(350.0));
        assert_eq!(wx.wind_direction_avg_deg, Some(5.0));
        assert_eq!(wx.wind_speed_kt, Some(8.5));
        assert_eq!(wx.wind_gust_kt, None);
        assert_eq!(wx.temperature_f, None);
        assert_eq!(wx.dewpoint_f, None);
        assert_eq!(wx.relative_humidity_pct, None);
        assert_eq!(wx.recommended_runway.as_deref(), Some("09"));
        assert_eq!(wx.recommendation_reason, None);
        assert_eq!(wx.satellite_count, Some(7));
    }

    #[test]
    fn test_normalize_is_pure() {
        let raw = RawTelemetry::new(json!({
            "wind_dir_gust_deg": 400,
            "wind_speed_kt": "12",
            "altimeter_inhg": 29.92,
        }));
        assert_eq!(normalize(&raw), normalize(&raw));
    }

    #[test]
    fn test_effective_wind_direction_priority() {
        let mut wx = WeatherSnapshot {
            wind_direction_avg_deg: Some(100.0),
            wind_direction_gust_deg: Some(110.0),
            ..Default::default()
        };
        assert_eq!(wx.effective_wind_direction(), Some(100.0));

        wx.wind_direction_deg = Some(90.0);
        assert_eq!(wx.effective_wind_direction(), Some(90.0));

        wx.wind_direction_deg = None;
        wx.wind_direction_avg_deg = None;
        assert_eq!(wx.effective_wind_direction(), Some(110.0));

        assert_eq!(WeatherSnapshot::default().effective_wind_direction(), None);
    }

    #[test]
    fn test_snapshot_serializes_wire_names() {
        let wx = WeatherSnapshot {
            sequence: Some(3),
            wind_direction_deg: Some(95.0),
            ..Default::default()
        };
        let v = serde_json::to_value(&wx).unwrap();
        assert_eq!(v, json!({ "msg_seq": 3, "wind_dir_deg": 95.0 }));
    }
}
