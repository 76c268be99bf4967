//! ISO-8601 (de)serialization of naive datetimes.
//!
//! Offset-bearing RFC 3339 inputs are accepted too and normalized to UTC.
//! Rendering always carries 6 fractional digits, unless there is no fraction at all.

use chrono::{DateTime, NaiveDateTime, Timelike};
use serde::{de, Deserialize, Deserializer, Serializer};

const FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";
const SECONDS_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
const MICROS_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

pub fn parse(s: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    NaiveDateTime::parse_from_str(s, FORMAT).or_else(|err| DateTime::parse_from_rfc3339(s).map(|dt| dt.naive_utc()).map_err(|_| err))
}

#[inline]
pub fn render(dt: &NaiveDateTime) -> String {
    let format = if dt.nanosecond() == 0 { SECONDS_FORMAT } else { MICROS_FORMAT };
    dt.format(format).to_string()
}

pub fn serialize<S: Serializer>(dt: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&render(dt))
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
    let s = <std::borrow::Cow<'de, str>>::deserialize(deserializer)?;
    parse(&s).map_err(|err| de::Error::custom(format!("invalid ISO-8601 datetime `{s}`: {err}")))
}
