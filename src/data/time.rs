use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

/// Absolute instant used to index every record.
pub type Timestamp = DateTime<Utc>;

/// Milliseconds in one spreadsheet day.
const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Day zero of spreadsheet serial dates.
///
/// 1899-12-30 rather than 1899-12-31 absorbs the fictitious 1900-02-29 that
/// spreadsheet programs count, so serials from 61 onward land on the right
/// calendar day.
pub fn spreadsheet_epoch() -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(1899, 12, 30).and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Convert a spreadsheet serial day count to an absolute instant.
///
/// The fractional part carries the time of day. The offset is rounded to the
/// nearest millisecond, so the same serial always maps to the same instant.
pub fn from_spreadsheet_serial(serial_days: f64) -> Option<Timestamp> {
    if !serial_days.is_finite() {
        return None;
    }
    let millis = (serial_days * MILLIS_PER_DAY).round();
    if millis.abs() > i64::MAX as f64 {
        return None;
    }
    let naive = spreadsheet_epoch()?.checked_add_signed(Duration::try_milliseconds(millis as i64)?)?;
    Some(naive.and_utc())
}

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parse a textual timestamp. Forms without an offset are read as UTC.
pub fn parse_timestamp(text: &str) -> Option<Timestamp> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Canonical text form used by exports: RFC 3339 with a `Z` suffix.
pub fn format_timestamp(ts: &Timestamp) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}
