//! Loading the declared race list from `races.json`.
//!
//! The file is a JSON array of race records:
//!
//! ```json
//! [
//!   {
//!     "name": "Western States 100",
//!     "start_dateTime": "2025-06-28T05:00:00-07:00",
//!     "end_dateTime": "2025-06-29T11:00:00-07:00",
//!     "timeZone": "America/Los_Angeles",
//!     "livestream_link": "https://example.com/live",
//!     "description": "100 miles",
//!     "location": "Olympic Valley, CA"
//!   }
//! ]
//! ```
//!
//! Empty strings mean "not set". Timestamps without an offset are read as
//! local time in `timeZone`. A `start_dateTime` still holding the scraper's
//! placeholder is rejected.

use std::path::Path;

use chrono::{DateTime, FixedOffset, LocalResult, NaiveDateTime, TimeZone};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{TrailcalError, TrailcalResult};
use crate::event::DeclaredEvent;
use crate::normalize;

/// Start value written for races whose time has to be filled in by hand.
pub(crate) const PLACEHOLDER_START: &str = "MANUAL_TIME_NEEDED_FROM";

/// Offset-carrying formats accepted besides strict RFC 3339.
const OFFSET_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M%:z", "%Y-%m-%d %H:%M:%S%:z"];

/// Local-time formats, resolved through the record's time zone.
const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"];

/// One record of `races.json`, as written by hand or by `scrape`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct RaceRecord {
    #[serde(default)]
    pub(crate) name: String,
    #[serde(rename = "start_dateTime", default)]
    pub(crate) start: String,
    #[serde(rename = "end_dateTime", default)]
    pub(crate) end: Option<String>,
    #[serde(rename = "timeZone", default)]
    pub(crate) time_zone: Option<String>,
    #[serde(rename = "livestream_link", default)]
    pub(crate) external_link: Option<String>,
    #[serde(default)]
    pub(crate) description: Option<String>,
    #[serde(default)]
    pub(crate) location: Option<String>,
}

/// Read and parse a races file.
pub fn load_races(path: &Path) -> TrailcalResult<Vec<DeclaredEvent>> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        TrailcalError::InvalidEventData(format!("could not read {}: {}", path.display(), e))
    })?;
    let races = parse_races(&content)?;
    tracing::debug!(path = %path.display(), races = races.len(), "loaded races");
    Ok(races)
}

/// Parse the content of a races file.
///
/// A single malformed record fails the whole list.
pub fn parse_races(content: &str) -> TrailcalResult<Vec<DeclaredEvent>> {
    let records: Vec<RaceRecord> = serde_json::from_str(content)
        .map_err(|e| TrailcalError::InvalidEventData(format!("races file is not valid: {e}")))?;

    records
        .into_iter()
        .enumerate()
        .map(|(index, record)| {
            record.into_event().map_err(|msg| {
                TrailcalError::InvalidEventData(format!("race #{}: {}", index + 1, msg))
            })
        })
        .collect()
}

impl RaceRecord {
    fn into_event(self) -> Result<DeclaredEvent, String> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err("missing name".into());
        }

        let tz = match normalize::text(self.time_zone.as_deref()) {
            Some(tz) => Some(
                tz.parse::<Tz>()
                    .map_err(|_| format!("'{name}' has unknown timeZone '{tz}'"))?,
            ),
            None => None,
        };

        let start = parse_timestamp(&self.start, tz)
            .map_err(|e| format!("'{name}' start_dateTime {e}"))?;
        let end = match normalize::text(self.end.as_deref()) {
            Some(end) => {
                Some(parse_timestamp(end, tz).map_err(|e| format!("'{name}' end_dateTime {e}"))?)
            }
            None => None,
        };

        let event = DeclaredEvent {
            name,
            start,
            end,
            time_zone: tz.map(|tz| tz.name().to_string()),
            location: owned(self.location),
            description: owned(self.description),
            external_link: owned(self.external_link),
        };
        event.validate().map_err(|e| e.to_string())?;

        Ok(event)
    }
}

fn owned(value: Option<String>) -> Option<String> {
    normalize::text(value.as_deref()).map(String::from)
}

fn parse_timestamp(raw: &str, tz: Option<Tz>) -> Result<DateTime<FixedOffset>, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err("is missing".into());
    }
    if raw.starts_with(PLACEHOLDER_START) {
        return Err(format!("is still a placeholder ('{raw}'), fill in the start time"));
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt);
    }
    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(raw, format) {
            return Ok(dt);
        }
    }

    let naive = NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .ok_or_else(|| format!("'{raw}' is not a timestamp"))?;
    let tz = tz.ok_or_else(|| format!("'{raw}' has no UTC offset and no timeZone is set"))?;

    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Ok(dt.fixed_offset()),
        LocalResult::Ambiguous(_, _) => Err(format!("'{raw}' is ambiguous in {}", tz.name())),
        LocalResult::None => Err(format!("'{raw}' does not exist in {}", tz.name())),
    }
}
