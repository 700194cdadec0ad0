// Parser for the published advisory sheet (CSV export)
//
// The sheet is maintained by hand, so three layouts are accepted, tried in order:
//
//   key/value          header/row            bare value
//   advisory,value     advisory,updated...   Runway 27 mowing today
//   advisory,Mowing    Mowing,1768719549
//   updated_unix_s,..
//   advisory_color,red
use crate::domain::advisory::{AdvisoryColor, AdvisoryPayload};

/// Parse one CSV document into an advisory. Never fails; unusable input
/// yields the empty payload.
pub fn parse_advisory_csv(text: &str) -> AdvisoryPayload {
    let text = text.trim_start_matches('\u{feff}').trim();
    let lines: Vec<&str> = text
        .lines()
        .map(|l| l.trim_end_matches('\r'))
        .filter(|l| !l.trim().is_empty())
        .collect();

    if lines.is_empty() {
        return AdvisoryPayload::empty();
    }

    parse_key_value(&lines)
        .or_else(|| parse_header_row(&lines))
        .unwrap_or_else(|| parse_single_value(&lines))
}

fn parse_key_value(lines: &[&str]) -> Option<AdvisoryPayload> {
    let header = parse_csv_line(lines[0]);
    if !header
        .get(1)
        .is_some_and(|h| h.eq_ignore_ascii_case("value"))
    {
        return None;
    }

    let mut payload = AdvisoryPayload::empty();
    for line in &lines[1..] {
        let row = parse_csv_line(line);
        let key = normalize_key(row.first().map_or("", String::as_str));
        let value = row.get(1).map_or("", |v| v.trim());

        match key.as_str() {
            "advisory" => payload.text = non_blank(value),
            "updated_unix_s" | "advisory_ts_unix_s" => payload.timestamp_unix_s = parse_timestamp(value),
            "advisory_color" | "advisorycolor" | "color" => {
                payload.color = AdvisoryColor::canonicalize(value)
            }
            _ => {}
        }
    }

    Some(payload)
}

fn parse_header_row(lines: &[&str]) -> Option<AdvisoryPayload> {
    if lines.len() < 2 {
        return None;
    }

    let header: Vec<String> = parse_csv_line(lines[0])
        .iter()
        .map(|h| normalize_key(h))
        .collect();
    let row = parse_csv_line(lines[1]);

    let column = |name: &str| header.iter().position(|h| h == name);
    let cell = |idx: Option<usize>| idx.and_then(|i| row.get(i)).map_or("", |c| c.trim());

    let text = cell(Some(column("advisory").unwrap_or(0)));
    let timestamp = cell(column("updated_unix_s"));
    let color = cell(column("advisory_color"));

    Some(AdvisoryPayload {
        text: non_blank(text),
        timestamp_unix_s: parse_timestamp(timestamp),
        color: AdvisoryColor::canonicalize(color),
    })
}

fn parse_single_value(lines: &[&str]) -> AdvisoryPayload {
    let first = parse_csv_line(lines[0]);
    AdvisoryPayload {
        text: first.first().and_then(|c| non_blank(c)),
        timestamp_unix_s: None,
        color: None,
    }
}

/// Split one CSV line into trimmed cells.
///
/// Double-quoted cells may contain commas and `""` escaped quotes.
pub fn parse_csv_line(line: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => cells.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }
    cells.push(current);

    cells.into_iter().map(|c| c.trim().to_string()).collect()
}

/// Lower-case a header/key and fold whitespace and hyphen runs into `_`.
pub fn normalize_key(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut in_separator = false;

    for ch in raw.trim().chars() {
        if ch.is_whitespace() || ch == '-' {
            if !in_separator {
                out.push('_');
                in_separator = true;
            }
            continue;
        }
        in_separator = false;
        if ch.is_ascii_alphanumeric() || ch == '_' {
            out.push(ch.to_ascii_lowercase());
        }
    }

    out
}

fn parse_timestamp(raw: &str) -> Option<i64> {
    let ts = raw.trim().parse::<f64>().ok()?;
    (ts.is_finite() && ts > 0.0).then_some(ts.trunc() as i64)
}

fn non_blank(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_csv_line_quotes() {
        assert_eq!(parse_csv_line("a,b,c"), vec!["a", "b", "c"]);
        assert_eq!(
            parse_csv_line(r#"advisory,"Mowing, then ""rolling"" the strip""#),
            vec!["advisory", r#"Mowing, then "rolling" the strip"#]
        );
        assert_eq!(parse_csv_line(" padded , cell "), vec!["padded", "cell"]);
        assert_eq!(parse_csv_line("trailing,"), vec!["trailing", ""]);
    }

    #[test]
    fn test_normalize_key() {
        assert_eq!(normalize_key("  Updated Unix-S "), "updated_unix_s");
        assert_eq!(normalize_key("Advisory  -  Color"), "advisory_color");
        assert_eq!(normalize_key("Advisory (text)"), "advisory_text");
        assert_eq!(normalize_key("ADVISORY"), "advisory");
    }

    #[test]
    fn test_key_value_sheet() {
        let csv = "advisory,value\r\n\
                   advisory,grading operations and plowing.\r\n\
                   updated_unix_s,1768719549\r\n\
                   advisory_color,Yellow\r\n";
        let payload = parse_advisory_csv(csv);
        assert_eq!(payload.text.as_deref(), Some("grading operations and plowing."));
        assert_eq!(payload.timestamp_unix_s, Some(1_768_719_549));
        assert_eq!(payload.color, Some(AdvisoryColor::Amber));
    }

    #[test]
    fn test_key_value_sheet_discards_bad_values() {
        let csv = "Key,VALUE\n\
                   Advisory Ts Unix S,-5\n\
                   color,purple\n\
                   advisory,   \n";
        let payload = parse_advisory_csv(csv);
        assert_eq!(payload, AdvisoryPayload::empty());

        let csv = "key,value\nadvisory_ts_unix_s,not a number\ncolor,grey\n";
        let payload = parse_advisory_csv(csv);
        assert_eq!(payload.timestamp_unix_s, None);
        assert_eq!(payload.color, Some(AdvisoryColor::Neutral));
    }

    #[test]
    fn test_header_and_row_sheet() {
        let csv = "Advisory Color,Updated Unix S,Advisory\nred,1700000500,\"Field closed, grading\"\n";
        let payload = parse_advisory_csv(csv);
        assert_eq!(payload.text.as_deref(), Some("Field closed, grading"));
        assert_eq!(payload.timestamp_unix_s, Some(1_700_000_500));
        assert_eq!(payload.color, Some(AdvisoryColor::Red));
    }

    #[test]
    fn test_header_row_falls_back_to_first_column() {
        let csv = "notice,when\nGlider tow ops today,noon\n";
        let payload = parse_advisory_csv(csv);
        assert_eq!(payload.text.as_deref(), Some("Glider tow ops today"));
        assert_eq!(payload.timestamp_unix_s, None);
        assert_eq!(payload.color, None);
    }

    #[test]
    fn test_single_value_sheet() {
        let payload = parse_advisory_csv("\"Runway 27 wet, use caution\"\n");
        assert_eq!(payload.text.as_deref(), Some("Runway 27 wet, use caution"));
        assert_eq!(payload.timestamp_unix_s, None);
        assert_eq!(payload.color, None);
    }

    #[test]
    fn test_empty_documents() {
        assert_eq!(parse_advisory_csv(""), AdvisoryPayload::empty());
        assert_eq!(parse_advisory_csv(" \n\r\n "), AdvisoryPayload::empty());
        assert_eq!(parse_advisory_csv("\u{feff}"), AdvisoryPayload::empty());
    }
}
