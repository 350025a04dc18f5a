//! ISO-8601 timestamps on the process-local clock.
//!
//! New records carry an RFC 3339 offset. Day files written by the previous
//! service hold naive local times, which are accepted on read.

use chrono::{DateTime, Local, NaiveDateTime};
use serde::{de, Deserialize, Deserializer, Serializer};

pub fn now() -> DateTime<Local> {
    Local::now()
}

pub fn parse(raw: &str) -> Option<DateTime<Local>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Local));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()?
        .and_local_timezone(Local)
        .earliest()
}

pub fn serialize<S>(ts: &DateTime<Local>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&ts.to_rfc3339())
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Local>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse(&raw).ok_or_else(|| de::Error::custom(format!("invalid timestamp: {}", raw)))
}
