//! Outcome of a reconciliation pass.

use std::fmt;

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use crate::diff::{DiffKind, EventDiff};
use crate::error::StoreError;
use crate::identity::DerivedKey;

/// A plan item that reached a terminal state other than failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportItem {
    pub key: DerivedKey,
    pub name: String,
}

impl From<&EventDiff> for ReportItem {
    fn from(diff: &EventDiff) -> Self {
        ReportItem {
            key: diff.key.clone(),
            name: diff.event.name.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    StoreUnavailable,
    StoreRejected,
    /// The event vanished between listing and updating it.
    Disappeared,
    /// The run was cancelled before this item was applied.
    Cancelled,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FailureKind::StoreUnavailable => "store unavailable",
            FailureKind::StoreRejected => "store rejected",
            FailureKind::Disappeared => "disappeared mid-run",
            FailureKind::Cancelled => "cancelled",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemFailure {
    pub key: DerivedKey,
    pub name: String,
    pub action: DiffKind,
    pub kind: FailureKind,
    pub reason: String,
}

impl fmt::Display for ItemFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} '{}' ({}): {}: {}",
            self.action, self.name, self.key, self.kind, self.reason
        )
    }
}

/// Terminal state of one plan item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    Created,
    Updated,
    Deleted,
    SkippedPastOrphan,
    Failed { kind: FailureKind, reason: String },
}

impl ItemOutcome {
    /// Classify a store error for the given action.
    ///
    /// A delete that finds nothing already has the outcome it wanted.
    pub fn from_store_error(action: DiffKind, err: StoreError) -> Self {
        match (action, err) {
            (DiffKind::Delete, StoreError::NotFound(_)) => ItemOutcome::Deleted,
            (DiffKind::Update, StoreError::NotFound(id)) => ItemOutcome::Failed {
                kind: FailureKind::Disappeared,
                reason: format!("{id} disappeared mid-run"),
            },
            (_, StoreError::Rejected(reason)) => ItemOutcome::Failed {
                kind: FailureKind::StoreRejected,
                reason,
            },
            (_, StoreError::Unavailable(reason)) | (_, StoreError::NotFound(reason)) => {
                ItemOutcome::Failed {
                    kind: FailureKind::StoreUnavailable,
                    reason,
                }
            }
        }
    }
}

/// How a run ended, for exit-code decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    Clean,
    /// Nothing failed, but past orphans were left in place.
    Warnings,
    Failed,
}

impl RunOutcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            RunOutcome::Clean | RunOutcome::Warnings => 0,
            RunOutcome::Failed => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReportCounts {
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub deleted: usize,
    pub skipped_past_orphans: usize,
    pub failed: usize,
}

impl ReportCounts {
    pub fn total(&self) -> usize {
        self.created
            + self.updated
            + self.unchanged
            + self.deleted
            + self.skipped_past_orphans
            + self.failed
    }
}

/// Per-bucket result of one reconciliation pass.
///
/// Every plan item lands in exactly one bucket. Serializes with its
/// `outcome` and `counts` ahead of the buckets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub created: Vec<ReportItem>,
    pub updated: Vec<ReportItem>,
    pub unchanged: Vec<DerivedKey>,
    pub deleted: Vec<ReportItem>,
    pub skipped_past_orphans: Vec<ReportItem>,
    pub failed: Vec<ItemFailure>,
}

impl SyncReport {
    pub fn record(&mut self, diff: &EventDiff, outcome: ItemOutcome) {
        let item = ReportItem::from(diff);
        match outcome {
            ItemOutcome::Created => self.created.push(item),
            ItemOutcome::Updated => self.updated.push(item),
            ItemOutcome::Deleted => self.deleted.push(item),
            ItemOutcome::SkippedPastOrphan => self.skipped_past_orphans.push(item),
            ItemOutcome::Failed { kind, reason } => self.failed.push(ItemFailure {
                key: item.key,
                name: item.name,
                action: diff.kind,
                kind,
                reason,
            }),
        }
    }

    pub fn record_unchanged(&mut self, key: DerivedKey) {
        self.unchanged.push(key);
    }

    pub fn counts(&self) -> ReportCounts {
        ReportCounts {
            created: self.created.len(),
            updated: self.updated.len(),
            unchanged: self.unchanged.len(),
            deleted: self.deleted.len(),
            skipped_past_orphans: self.skipped_past_orphans.len(),
            failed: self.failed.len(),
        }
    }

    /// True when the pass changed nothing remotely and nothing failed.
    pub fn is_noop(&self) -> bool {
        self.created.is_empty()
            && self.updated.is_empty()
            && self.deleted.is_empty()
            && self.failed.is_empty()
    }

    pub fn outcome(&self) -> RunOutcome {
        if !self.failed.is_empty() {
            RunOutcome::Failed
        } else if !self.skipped_past_orphans.is_empty() {
            RunOutcome::Warnings
        } else {
            RunOutcome::Clean
        }
    }
}

impl Serialize for SyncReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("SyncReport", 8)?;
        state.serialize_field("outcome", &self.outcome())?;
        state.serialize_field("counts", &self.counts())?;
        state.serialize_field("created", &self.created)?;
        state.serialize_field("updated", &self.updated)?;
        state.serialize_field("unchanged", &self.unchanged)?;
        state.serialize_field("deleted", &self.deleted)?;
        state.serialize_field("skipped_past_orphans", &self.skipped_past_orphans)?;
        state.serialize_field("failed", &self.failed)?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::DeclaredEvent;
    use chrono::DateTime;

    fn diff(kind: DiffKind, id: &str) -> EventDiff {
        let event = DeclaredEvent::new(
            "Race A",
            DateTime::parse_from_rfc3339("2025-06-01T08:00:00-05:00").unwrap(),
        );
        let key = DerivedKey::from_remote_id(id);
        match kind {
            DiffKind::Create => EventDiff::create(key, event),
            DiffKind::Update => EventDiff::update(key, event, Vec::new()),
            DiffKind::Delete => EventDiff::delete(key, event),
        }
    }

    #[test]
    fn test_not_found_depends_on_action() {
        let gone = || StoreError::NotFound("trailcal1".into());

        assert_eq!(
            ItemOutcome::from_store_error(DiffKind::Delete, gone()),
            ItemOutcome::Deleted
        );
        assert!(matches!(
            ItemOutcome::from_store_error(DiffKind::Update, gone()),
            ItemOutcome::Failed {
                kind: FailureKind::Disappeared,
                ..
            }
        ));
        assert!(matches!(
            ItemOutcome::from_store_error(DiffKind::Create, gone()),
            ItemOutcome::Failed {
                kind: FailureKind::StoreUnavailable,
                ..
            }
        ));
    }

    #[test]
    fn test_outcome_and_exit_code() {
        let mut report = SyncReport::default();
        report.record(&diff(DiffKind::Create, "trailcal1"), ItemOutcome::Created);
        assert_eq!(report.outcome(), RunOutcome::Clean);

        report.record(
            &diff(DiffKind::Delete, "trailcal2"),
            ItemOutcome::SkippedPastOrphan,
        );
        assert_eq!(report.outcome(), RunOutcome::Warnings);
        assert_eq!(report.outcome().exit_code(), 0);

        report.record(
            &diff(DiffKind::Update, "trailcal3"),
            ItemOutcome::Failed {
                kind: FailureKind::StoreRejected,
                reason: "bad".into(),
            },
        );
        assert_eq!(report.outcome(), RunOutcome::Failed);
        assert_eq!(report.outcome().exit_code(), 1);

        let counts = report.counts();
        assert_eq!(counts.total(), 3);
        assert_eq!(report.failed[0].action, DiffKind::Update);
    }

    #[test]
    fn test_failure_display() {
        let failure = ItemFailure {
            key: DerivedKey::from_remote_id("trailcal1"),
            name: "Race A".into(),
            action: DiffKind::Update,
            kind: FailureKind::Disappeared,
            reason: "trailcal1 disappeared mid-run".into(),
        };
        assert_eq!(
            failure.to_string(),
            "update 'Race A' (trailcal1): disappeared mid-run: trailcal1 disappeared mid-run"
        );
    }

    #[test]
    fn test_json_carries_outcome_and_counts() {
        let mut report = SyncReport::default();
        report.record(&diff(DiffKind::Create, "trailcal1"), ItemOutcome::Created);
        report.record(
            &diff(DiffKind::Delete, "trailcal2"),
            ItemOutcome::SkippedPastOrphan,
        );
        report.record_unchanged(DerivedKey::from_remote_id("trailcal3"));

        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["outcome"], "warnings");
        assert_eq!(json["counts"]["created"], 1);
        assert_eq!(json["counts"]["skipped_past_orphans"], 1);
        assert_eq!(json["counts"]["unchanged"], 1);
        assert_eq!(json["counts"]["failed"], 0);
        assert_eq!(json["created"][0]["key"], "trailcal1");
        assert_eq!(json["unchanged"][0], "trailcal3");
    }
}
