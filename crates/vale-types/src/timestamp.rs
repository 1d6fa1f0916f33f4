//! Timestamp and date handling shared by the index and sidecar formats.
//!
//! Timestamps are written as RFC 3339. On read, naive ISO-8601 values
//! without an offset (as produced by older desktop builds) are accepted and
//! interpreted in local time.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};

use crate::error::TypeError;

/// A point in time, normalized to UTC.
pub type Timestamp = DateTime<Utc>;

const NAIVE_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

/// Interpret a wall-clock time in the local timezone.
///
/// Ambiguous local times (DST fold) resolve to the earliest instant; times
/// that do not exist locally fall back to treating the value as UTC.
pub fn from_local_naive(naive: NaiveDateTime) -> Timestamp {
    match Local.from_local_datetime(&naive).earliest() {
        Some(local) => local.with_timezone(&Utc),
        None => naive.and_utc(),
    }
}

/// Parse an RFC 3339 or naive ISO-8601 timestamp.
pub fn parse_lenient(value: &str) -> Result<Timestamp, TypeError> {
    let value = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(from_local_naive)
        .ok_or_else(|| TypeError::InvalidTimestamp(value.to_string()))
}

/// Render a timestamp in the canonical on-disk form.
pub fn format(ts: &Timestamp) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parse an expiry date. Empty strings mean "no expiry".
///
/// Accepts `YYYY-MM-DD` and full ISO datetimes (the date part is kept).
pub fn parse_expiry(value: &str) -> Result<Option<NaiveDate>, TypeError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    let date_part = value.get(..10).unwrap_or(value);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| TypeError::InvalidTimestamp(value.to_string()))
}

/// Serde adapter for [`Timestamp`] fields using [`parse_lenient`].
pub mod lenient {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::Timestamp;

    pub fn serialize<S: Serializer>(ts: &Timestamp, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format(ts))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Timestamp, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_lenient(&raw).map_err(serde::de::Error::custom)
    }
}

/// Serde adapter for optional expiry dates (`null`, `""`, or `YYYY-MM-DD`).
pub mod expiry {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        date: &Option<NaiveDate>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match date {
            Some(d) => serializer.serialize_str(&d.format("%Y-%m-%d").to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveDate>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(raw) => super::parse_expiry(&raw).map_err(serde::de::Error::custom),
            None => Ok(None),
        }
    }
}
