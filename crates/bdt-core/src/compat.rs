//! Lenient readers for fields written by older data files.
//!
//! Older files leave unset buckets as `""` and write timestamps without a
//! UTC offset. Both still load; output always uses RFC 3339.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::de::{self, Deserializer};
use serde::Deserialize;

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parses an RFC 3339 timestamp, or a naive one which is taken as UTC.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    let raw = raw.trim();
    let rfc_err = match DateTime::parse_from_rfc3339(raw) {
        Ok(parsed) => return Ok(parsed.with_timezone(&Utc)),
        Err(err) => err,
    };
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
        .ok_or(rfc_err)
}

pub(crate) fn timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .map_err(|err| de::Error::custom(format!("invalid timestamp `{raw}`: {err}")))
}

/// `null`, a missing key and a blank string all read as `None`.
pub(crate) fn blank_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: fmt::Display,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(label) => label.parse().map(Some).map_err(de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn naive_timestamps_read_as_utc() {
        let expected = Utc
            .with_ymd_and_hms(2024, 5, 1, 10, 0, 0)
            .single()
            .unwrap()
            + chrono::Duration::microseconds(123_456);
        assert_eq!(parse_timestamp("2024-05-01T10:00:00.123456"), Ok(expected));
        assert_eq!(
            parse_timestamp("2024-05-01 10:00:00"),
            Ok(Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).single().unwrap())
        );
        assert_eq!(
            parse_timestamp("2024-05-01T12:00:00+02:00"),
            Ok(Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).single().unwrap())
        );
        assert!(parse_timestamp("yesterday").is_err());
    }
}
