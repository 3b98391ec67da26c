/// Lenient date parsing for task due dates and listing bounds
///
/// Accepts a full RFC 3339 timestamp (`2025-03-01T18:30:00Z`,
/// `2025-03-01T18:30:00+02:00`) or a bare calendar date (`2025-03-01`),
/// which means midnight UTC on that day.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Deserializer};

/// Parses `raw` into a UTC timestamp, or `None` if it is neither form
pub fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Serde adapter for `Option<DateTime<Utc>>` fields using [`parse_datetime`]
///
/// Use with `#[serde(default, deserialize_with = "...")]` so a missing field
/// stays `None`. An explicit `null` is also `None`.
pub fn deserialize_opt<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(raw) => parse_datetime(&raw)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid date: {}", raw))),
    }
}
