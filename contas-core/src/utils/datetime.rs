//! Datetime serialization/deserialization helpers.
//!
//! - Serialization: `DateTime<Utc>` -> RFC3339 string with microseconds
//! - Deserialization: RFC3339 string or Unix timestamp -> `DateTime<Utc>`
//!
//! The backend returns `timestamptz` columns either as `2024-05-01T12:00:00.123456+00:00`
//! or, from older rows, without an offset (`2024-05-01T12:00:00.123456`), which is
//! read as UTC.

use chrono::{DateTime, NaiveDateTime, Utc};
use contas_backend::format_timestamp;
use serde::{Deserialize, Deserializer, Serializer};

/// Parse a timestamp as the backend writes it.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|naive| naive.and_utc())
        })
}

/// Serializes `DateTime<Utc>` as an RFC3339 string.
pub fn serialize<S>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format_timestamp(dt))
}

/// Deserializes `DateTime<Utc>` from RFC3339 or Unix timestamp.
pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match TimestampOrString::deserialize(deserializer)? {
        TimestampOrString::String(s) => parse_timestamp(&s)
            .ok_or_else(|| Error::custom(format!("Invalid timestamp: {s}"))),
        TimestampOrString::I64(ts) => {
            parse_unix_timestamp(ts).ok_or_else(|| Error::custom("Invalid Unix timestamp"))
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TimestampOrString {
    String(String),
    I64(i64),
}

/// `Option<DateTime<Utc>>` serializer/deserializer helpers.
pub mod option {
    use super::{
        format_timestamp, parse_timestamp, parse_unix_timestamp, DateTime, Deserialize,
        Deserializer, Serializer, TimestampOrString, Utc,
    };

    /// Serializes `Option<DateTime<Utc>>` as RFC3339 or `null`.
    pub fn serialize<S>(dt: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match dt {
            Some(dt) => serializer.serialize_some(&format_timestamp(dt)),
            None => serializer.serialize_none(),
        }
    }

    /// Deserializes `Option<DateTime<Utc>>` from RFC3339, Unix timestamp, or `null`.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::Error;

        match Option::<TimestampOrString>::deserialize(deserializer)? {
            Some(TimestampOrString::String(s)) => parse_timestamp(&s)
                .map(Some)
                .ok_or_else(|| Error::custom(format!("Invalid timestamp: {s}"))),
            Some(TimestampOrString::I64(ts)) => parse_unix_timestamp(ts)
                .map(Some)
                .ok_or_else(|| Error::custom("Invalid Unix timestamp")),
            None => Ok(None),
        }
    }
}

/// Parses a Unix timestamp with second/millisecond auto-detection.
fn parse_unix_timestamp(ts: i64) -> Option<DateTime<Utc>> {
    // Values larger than 10^11 are interpreted as milliseconds.
    if ts > 100_000_000_000 {
        DateTime::from_timestamp_millis(ts)
    } else {
        DateTime::from_timestamp(ts, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Serialize, Deserialize)]
    struct Stamped {
        #[serde(default, with = "option")]
        at: Option<DateTime<Utc>>,
    }

    #[test]
    fn parses_offset_and_naive_forms() {
        let with_offset = parse_timestamp("2024-05-01T12:00:00.123456+00:00").unwrap();
        let naive = parse_timestamp("2024-05-01T12:00:00.123456").unwrap();
        assert_eq!(with_offset, naive);
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn option_round_trip_keeps_micros() {
        let json = r#"{"at":"2024-05-01T12:00:00.000001Z"}"#;
        let stamped: Stamped = serde_json::from_str(json).unwrap();
        assert_eq!(serde_json::to_string(&stamped).unwrap(), json);
    }

    #[test]
    fn option_accepts_null_missing_and_unix() {
        let stamped: Stamped = serde_json::from_str(r#"{"at":null}"#).unwrap();
        assert!(stamped.at.is_none());
        let stamped: Stamped = serde_json::from_str("{}").unwrap();
        assert!(stamped.at.is_none());
        let stamped: Stamped = serde_json::from_str(r#"{"at":1714564800}"#).unwrap();
        assert_eq!(stamped.at, DateTime::from_timestamp(1_714_564_800, 0));
    }
}
