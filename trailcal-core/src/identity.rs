//! Content-derived event keys.
//!
//! A race's key is a pure function of its name, start instant and location,
//! prefixed with the namespace so managed remote events can be told apart
//! from everything else in the calendar.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{TrailcalError, TrailcalResult};
use crate::event::DeclaredEvent;
use crate::normalize;

/// Prefix used when none is configured.
pub const DEFAULT_PREFIX: &str = "trailcal";

/// Hex characters kept from the digest (128 bits).
const KEY_HASH_LEN: usize = 32;

/// The id prefix that marks a remote event as managed by this tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Namespace(String);

impl Namespace {
    pub fn new(prefix: impl Into<String>) -> TrailcalResult<Self> {
        let prefix = prefix.into();
        if prefix.is_empty() || !prefix.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(TrailcalError::Config(format!(
                "Invalid namespace prefix '{prefix}': use ASCII letters and digits only"
            )));
        }
        Ok(Namespace(prefix))
    }

    pub fn prefix(&self) -> &str {
        &self.0
    }

    /// Whether a remote id belongs to this namespace.
    ///
    /// Ownership is a plain prefix match: namespaces sharing one store must
    /// not be prefixes of each other, or the shorter one claims (and deletes)
    /// the longer one's events.
    pub fn owns(&self, id: &str) -> bool {
        id.starts_with(&self.0)
    }
}

impl Default for Namespace {
    fn default() -> Self {
        Namespace(DEFAULT_PREFIX.to_string())
    }
}

impl TryFrom<String> for Namespace {
    type Error = TrailcalError;

    fn try_from(value: String) -> TrailcalResult<Self> {
        Namespace::new(value)
    }
}

impl From<Namespace> for String {
    fn from(ns: Namespace) -> Self {
        ns.0
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a managed event, shared between declared and remote side.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DerivedKey(String);

impl DerivedKey {
    /// Wrap the id of a remote event that is already known to be managed.
    pub(crate) fn from_remote_id(id: &str) -> Self {
        DerivedKey(id.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DerivedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Derive the key of a declared race.
///
/// Fails with `InvalidEventData` when the race itself is malformed.
pub fn derive(namespace: &Namespace, event: &DeclaredEvent) -> TrailcalResult<DerivedKey> {
    event.validate()?;

    let start = normalize::instant_string(&event.start);
    let mut hasher = blake3::Hasher::new();
    for field in [
        Some(event.name.trim()),
        Some(start.as_str()),
        normalize::text(event.location.as_deref()),
    ] {
        let bytes = field.unwrap_or_default().as_bytes();
        hasher.update(&(bytes.len() as u64).to_le_bytes());
        hasher.update(bytes);
    }

    let digest = hex::encode(hasher.finalize().as_bytes());
    Ok(DerivedKey(format!(
        "{}{}",
        namespace.prefix(),
        &digest[..KEY_HASH_LEN]
    )))
}

/// Derive keys for a whole declared list.
///
/// Two races landing on one key is a `DuplicateKey` error: the later one would
/// otherwise silently overwrite the earlier remote event.
pub fn derive_all<'a>(
    namespace: &Namespace,
    events: &'a [DeclaredEvent],
) -> TrailcalResult<BTreeMap<DerivedKey, &'a DeclaredEvent>> {
    let mut keyed: BTreeMap<DerivedKey, &'a DeclaredEvent> = BTreeMap::new();

    for (index, event) in events.iter().enumerate() {
        let key = derive(namespace, event).map_err(|e| match e {
            TrailcalError::InvalidEventData(msg) => {
                TrailcalError::InvalidEventData(format!("race #{}: {}", index + 1, msg))
            }
            other => other,
        })?;

        if let Some(existing) = keyed.get(&key) {
            return Err(TrailcalError::DuplicateKey {
                key: key.to_string(),
                first: existing.name.clone(),
                second: event.name.clone(),
            });
        }

        keyed.insert(key, event);
    }

    Ok(keyed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    fn race(name: &str, start: &str, location: Option<&str>) -> DeclaredEvent {
        let mut event = DeclaredEvent::new(name, DateTime::parse_from_rfc3339(start).unwrap());
        event.location = location.map(String::from);
        event
    }

    #[test]
    fn test_derive_is_deterministic() {
        let ns = Namespace::default();
        let event = race("Race A", "2025-06-01T08:00:00-05:00", Some("Boulder, CO"));

        let a = derive(&ns, &event).unwrap();
        let b = derive(&ns, &event.clone()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_derive_is_stable_across_releases() {
        // Keys are persisted remotely, so the encoding must never drift.
        let ns = Namespace::default();
        let event = race("Race A", "2025-06-01T08:00:00-05:00", Some("Boulder, CO"));

        assert_eq!(
            derive(&ns, &event).unwrap().as_str(),
            "trailcalab1648741004c883cfe663e043bd1c49"
        );
    }

    #[test]
    fn test_derive_is_namespaced() {
        let ns = Namespace::new("racecal").unwrap();
        let key = derive(&ns, &race("Race A", "2025-06-01T08:00:00-05:00", None)).unwrap();

        assert!(key.as_str().starts_with("racecal"));
        assert!(ns.owns(key.as_str()));
        assert_eq!(key.as_str().len(), "racecal".len() + KEY_HASH_LEN);
    }

    #[test]
    fn test_derive_ignores_equivalent_representations() {
        let ns = Namespace::default();
        let a = race("Race A", "2025-06-01T08:00:00-05:00", Some("Boulder, CO"));
        let b = race("  Race A ", "2025-06-01T13:00:00Z", Some("Boulder, CO  "));

        assert_eq!(derive(&ns, &a).unwrap(), derive(&ns, &b).unwrap());
    }

    #[test]
    fn test_derive_ignores_payload_fields() {
        let ns = Namespace::default();
        let a = race("Race A", "2025-06-01T08:00:00-05:00", None);
        let mut b = a.clone();
        b.description = Some("v2".into());
        b.external_link = Some("https://example.com/live".into());
        b.end = Some(DateTime::parse_from_rfc3339("2025-06-01T18:00:00-05:00").unwrap());

        assert_eq!(derive(&ns, &a).unwrap(), derive(&ns, &b).unwrap());
    }

    #[test]
    fn test_derive_changes_with_identity_fields() {
        let ns = Namespace::default();
        let base = race("Race A", "2025-06-01T08:00:00-05:00", Some("Boulder, CO"));
        let key = derive(&ns, &base).unwrap();

        let renamed = race("Race B", "2025-06-01T08:00:00-05:00", Some("Boulder, CO"));
        let moved = race("Race A", "2025-06-01T09:00:00-05:00", Some("Boulder, CO"));
        let relocated = race("Race A", "2025-06-01T08:00:00-05:00", Some("Golden, CO"));
        let unlocated = race("Race A", "2025-06-01T08:00:00-05:00", None);

        for other in [renamed, moved, relocated, unlocated] {
            assert_ne!(key, derive(&ns, &other).unwrap(), "{other:?}");
        }
    }

    #[test]
    fn test_field_boundaries_are_unambiguous() {
        let ns = Namespace::default();
        let a = race("Race A", "2025-06-01T08:00:00-05:00", Some("B"));
        let b = race("Race AB", "2025-06-01T08:00:00-05:00", None);
        assert_ne!(derive(&ns, &a).unwrap(), derive(&ns, &b).unwrap());
    }

    #[test]
    fn test_derive_rejects_invalid_event() {
        let ns = Namespace::default();
        let err = derive(&ns, &race("", "2025-06-01T08:00:00-05:00", None)).unwrap_err();
        assert!(matches!(err, TrailcalError::InvalidEventData(_)));
    }

    #[test]
    fn test_derive_all_reports_duplicates() {
        let ns = Namespace::default();
        let events = vec![
            race("Race A", "2025-06-01T08:00:00-05:00", None),
            race("Race B", "2025-07-01T08:00:00-05:00", None),
            race("Race A ", "2025-06-01T13:00:00Z", None),
        ];

        match derive_all(&ns, &events) {
            Err(TrailcalError::DuplicateKey { first, second, .. }) => {
                assert_eq!(first, "Race A");
                assert_eq!(second, "Race A ");
            }
            other => panic!("expected DuplicateKey, got {other:?}"),
        }
    }

    #[test]
    fn test_derive_all_names_offending_record() {
        let ns = Namespace::default();
        let events = vec![
            race("Race A", "2025-06-01T08:00:00-05:00", None),
            race(" ", "2025-07-01T08:00:00-05:00", None),
        ];

        let err = derive_all(&ns, &events).unwrap_err();
        assert!(err.to_string().contains("race #2"), "{err}");
    }

    #[test]
    fn test_namespace_validation() {
        assert!(Namespace::new("trailcal").is_ok());
        assert!(Namespace::new("").is_err());
        assert!(Namespace::new("trail-cal").is_err());
        assert!(Namespace::new("trail cal").is_err());
    }

    #[test]
    fn test_namespace_owns_by_prefix() {
        let ns = Namespace::new("trailca").unwrap();
        assert!(ns.owns("trailca0123"));
        assert!(ns.owns("trailcal0123"));
        assert!(!ns.owns("trail0123"));
    }
}
