//! Race event types.
//!
//! `DeclaredEvent` is one entry of the declared race list. `RemoteEvent` is the
//! same data as the remote store holds it, keyed by the id the store knows it
//! under. Providers convert their API representation into `RemoteEvent`.

use std::fmt;

use chrono::{DateTime, FixedOffset, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{TrailcalError, TrailcalResult};

/// A race as declared in the source list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeclaredEvent {
    pub name: String,
    pub start: DateTime<FixedOffset>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<DateTime<FixedOffset>>,
    /// IANA zone name, e.g. "America/Denver"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Livestream or race page URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_link: Option<String>,
}

impl DeclaredEvent {
    pub fn new(name: impl Into<String>, start: DateTime<FixedOffset>) -> Self {
        DeclaredEvent {
            name: name.into(),
            start,
            end: None,
            time_zone: None,
            location: None,
            description: None,
            external_link: None,
        }
    }

    /// Check the invariants a declared race must hold before it can be keyed.
    pub fn validate(&self) -> TrailcalResult<()> {
        if self.name.trim().is_empty() {
            return Err(TrailcalError::InvalidEventData(format!(
                "race starting {} has an empty name",
                self.start.to_rfc3339()
            )));
        }

        if let Some(end) = self.end {
            if end < self.start {
                return Err(TrailcalError::InvalidEventData(format!(
                    "'{}' ends ({}) before it starts ({})",
                    self.name,
                    end.to_rfc3339(),
                    self.start.to_rfc3339()
                )));
            }
        }

        if let Some(tz) = self.time_zone.as_deref().map(str::trim) {
            if !tz.is_empty() && tz.parse::<Tz>().is_err() {
                return Err(TrailcalError::InvalidEventData(format!(
                    "'{}' has unknown time zone '{}'",
                    self.name, tz
                )));
            }
        }

        Ok(())
    }

    pub fn start_utc(&self) -> DateTime<Utc> {
        self.start.to_utc()
    }
}

impl fmt::Display for DeclaredEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// A managed event as the remote store returns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteEvent {
    pub id: String,
    #[serde(flatten)]
    pub event: DeclaredEvent,
}

impl RemoteEvent {
    pub fn new(id: impl Into<String>, event: DeclaredEvent) -> Self {
        RemoteEvent {
            id: id.into(),
            event,
        }
    }
}

impl fmt::Display for RemoteEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.event.name, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    #[test]
    fn test_validate_rejects_blank_name() {
        let event = DeclaredEvent::new("   ", at("2025-06-01T08:00:00-05:00"));
        assert!(matches!(
            event.validate(),
            Err(TrailcalError::InvalidEventData(_))
        ));
    }

    #[test]
    fn test_validate_rejects_end_before_start() {
        let mut event = DeclaredEvent::new("Race A", at("2025-06-01T08:00:00-05:00"));
        event.end = Some(at("2025-06-01T07:00:00-05:00"));
        assert!(event.validate().is_err());

        event.end = Some(at("2025-06-01T08:00:00-05:00"));
        assert!(event.validate().is_ok());
    }

    #[test]
    fn test_validate_time_zone() {
        let mut event = DeclaredEvent::new("Race A", at("2025-06-01T08:00:00-05:00"));
        event.time_zone = Some("America/Chicago".into());
        assert!(event.validate().is_ok());

        event.time_zone = Some("".into());
        assert!(event.validate().is_ok());

        event.time_zone = Some("Mars/Olympus_Mons".into());
        assert!(event.validate().is_err());
    }

    #[test]
    fn test_remote_event_json_is_flat() {
        let remote = RemoteEvent::new(
            "trailcalabc",
            DeclaredEvent::new("Race A", at("2025-06-01T08:00:00-05:00")),
        );
        let json = serde_json::to_value(&remote).unwrap();
        assert_eq!(json["id"], "trailcalabc");
        assert_eq!(json["name"], "Race A");
        assert!(json.get("description").is_none());
    }
}
