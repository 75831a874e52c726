//! Field-by-field change detection between a declared race and its remote copy.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::diff::DiffKind;
use crate::event::DeclaredEvent;
use crate::identity::DerivedKey;
use crate::normalize;

/// One planned mutation.
///
/// `event` is the declared race for creates and updates, and the remote copy
/// for deletes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventDiff {
    pub kind: DiffKind,
    pub key: DerivedKey,
    pub event: DeclaredEvent,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub changes: Vec<FieldChange>,
}

impl fmt::Display for EventDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind.symbol(), self.event)
    }
}

impl EventDiff {
    pub fn create(key: DerivedKey, event: DeclaredEvent) -> Self {
        EventDiff {
            kind: DiffKind::Create,
            key,
            event,
            changes: Vec::new(),
        }
    }

    pub fn update(key: DerivedKey, event: DeclaredEvent, changes: Vec<FieldChange>) -> Self {
        EventDiff {
            kind: DiffKind::Update,
            key,
            event,
            changes,
        }
    }

    pub fn delete(key: DerivedKey, remote: DeclaredEvent) -> Self {
        EventDiff {
            kind: DiffKind::Delete,
            key,
            event: remote,
            changes: Vec::new(),
        }
    }
}

/// Fields compared for in-place updates.
///
/// Name, start and location are part of the derived key, so a change there
/// never reaches this comparison: it shows up as an orphan plus a create.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    End,
    TimeZone,
    Description,
    ExternalLink,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::End => "end",
            Field::TimeZone => "time_zone",
            Field::Description => "description",
            Field::ExternalLink => "external_link",
        };
        f.write_str(name)
    }
}

/// One differing field, with both sides in normalized display form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldChange {
    pub field: Field,
    pub old: Option<String>,
    pub new: Option<String>,
}

impl FieldChange {
    fn text(field: Field, old: Option<&str>, new: Option<&str>) -> Option<FieldChange> {
        let (old, new) = (normalize::text(old), normalize::text(new));
        (old != new).then(|| FieldChange {
            field,
            old: old.map(String::from),
            new: new.map(String::from),
        })
    }
}

/// Compare the payload fields of `declared` against what the store holds.
///
/// Returns an empty list when nothing needs updating.
pub fn changed_fields(remote: &DeclaredEvent, declared: &DeclaredEvent) -> Vec<FieldChange> {
    let mut changes = Vec::new();

    let (old_end, new_end) = (remote.end.as_ref(), declared.end.as_ref());
    if normalize::instant_opt(old_end) != normalize::instant_opt(new_end) {
        changes.push(FieldChange {
            field: Field::End,
            old: old_end.map(normalize::instant_string),
            new: new_end.map(normalize::instant_string),
        });
    }

    changes.extend(FieldChange::text(
        Field::TimeZone,
        remote.time_zone.as_deref(),
        declared.time_zone.as_deref(),
    ));
    changes.extend(FieldChange::text(
        Field::Description,
        remote.description.as_deref(),
        declared.description.as_deref(),
    ));
    changes.extend(FieldChange::text(
        Field::ExternalLink,
        remote.external_link.as_deref(),
        declared.external_link.as_deref(),
    ));

    changes
}
