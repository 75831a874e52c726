//! Normalization rules shared by key derivation and change detection.
//!
//! Two values that normalize equal are the same value: nothing downstream
//! may compare raw strings or raw offsets.

use chrono::{DateTime, FixedOffset, SecondsFormat, Utc};

/// Trimmed text, with empty treated as absent.
pub fn text(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

/// Absolute instant at second precision.
pub fn instant(value: &DateTime<FixedOffset>) -> DateTime<Utc> {
    let utc = value.to_utc();
    DateTime::from_timestamp(utc.timestamp(), 0).unwrap_or(utc)
}

pub fn instant_opt(value: Option<&DateTime<FixedOffset>>) -> Option<DateTime<Utc>> {
    value.map(instant)
}

/// Canonical string form of an instant, used for hashing and display.
pub fn instant_string(value: &DateTime<FixedOffset>) -> String {
    instant(value).to_rfc3339_opts(SecondsFormat::Secs, true)
}
