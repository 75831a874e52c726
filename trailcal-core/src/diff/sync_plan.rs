//! Plan computation: declared races against managed remote events.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::diff::{EventDiff, changed_fields};
use crate::error::TrailcalResult;
use crate::event::{DeclaredEvent, RemoteEvent};
use crate::identity::{self, DerivedKey, Namespace};

/// Everything one reconciliation pass intends to do.
///
/// Built fresh for each run and never persisted.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncPlan {
    pub to_create: Vec<EventDiff>,
    pub to_update: Vec<EventDiff>,
    pub to_delete: Vec<EventDiff>,
    pub unchanged: Vec<DerivedKey>,
}

impl SyncPlan {
    /// Classify every declared race and managed remote event.
    ///
    /// Fails before producing anything when a race is malformed or two races
    /// share a key. Remote events outside `namespace` are ignored.
    pub fn build(
        namespace: &Namespace,
        declared: &[DeclaredEvent],
        remote: &[RemoteEvent],
    ) -> TrailcalResult<Self> {
        let declared_by_key = identity::derive_all(namespace, declared)?;

        let remote_by_key: BTreeMap<DerivedKey, &RemoteEvent> = remote
            .iter()
            .filter(|r| namespace.owns(&r.id))
            .map(|r| (DerivedKey::from_remote_id(&r.id), r))
            .collect();

        let mut plan = SyncPlan::default();

        for (key, event) in &declared_by_key {
            match remote_by_key.get(key) {
                None => plan
                    .to_create
                    .push(EventDiff::create(key.clone(), (*event).clone())),
                Some(existing) => {
                    let changes = changed_fields(&existing.event, event);
                    if changes.is_empty() {
                        plan.unchanged.push(key.clone());
                    } else {
                        plan.to_update
                            .push(EventDiff::update(key.clone(), (*event).clone(), changes));
                    }
                }
            }
        }

        for (key, orphan) in &remote_by_key {
            if !declared_by_key.contains_key(key) {
                plan.to_delete
                    .push(EventDiff::delete(key.clone(), orphan.event.clone()));
            }
        }

        let by_start = |a: &EventDiff, b: &EventDiff| {
            a.event
                .start_utc()
                .cmp(&b.event.start_utc())
                .then_with(|| a.key.cmp(&b.key))
        };
        plan.to_create.sort_by(by_start);
        plan.to_update.sort_by(by_start);
        plan.to_delete.sort_by(by_start);

        Ok(plan)
    }

    /// True when applying the plan would not touch the store.
    pub fn is_empty(&self) -> bool {
        self.to_create.is_empty() && self.to_update.is_empty() && self.to_delete.is_empty()
    }

    /// Number of items the plan covers, unchanged ones included.
    pub fn len(&self) -> usize {
        self.to_create.len() + self.to_update.len() + self.to_delete.len() + self.unchanged.len()
    }

    /// Mutations in application order: creates, updates, deletes.
    pub fn mutations(&self) -> impl Iterator<Item = &EventDiff> {
        self.to_create
            .iter()
            .chain(&self.to_update)
            .chain(&self.to_delete)
    }

    /// (created, updated, deleted) counts, like the pushed summary line.
    pub fn counts(&self) -> (usize, usize, usize) {
        (
            self.to_create.len(),
            self.to_update.len(),
            self.to_delete.len(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::{DiffKind, Field};
    use crate::error::TrailcalError;
    use chrono::DateTime;

    fn race(name: &str, start: &str) -> DeclaredEvent {
        DeclaredEvent::new(name, DateTime::parse_from_rfc3339(start).unwrap())
    }

    fn stored(ns: &Namespace, event: &DeclaredEvent) -> RemoteEvent {
        let key = identity::derive(ns, event).unwrap();
        RemoteEvent::new(key.as_str(), event.clone())
    }

    #[test]
    fn test_new_race_is_created() {
        let ns = Namespace::default();
        let declared = vec![race("Race A", "2025-06-01T08:00:00-05:00")];

        let plan = SyncPlan::build(&ns, &declared, &[]).unwrap();

        assert_eq!(plan.counts(), (1, 0, 0));
        assert_eq!(plan.to_create[0].kind, DiffKind::Create);
        assert_eq!(plan.to_create[0].event.name, "Race A");
        assert!(plan.unchanged.is_empty());
    }

    #[test]
    fn test_description_change_is_an_update() {
        let ns = Namespace::default();
        let mut v1 = race("Race A", "2025-06-01T08:00:00-05:00");
        v1.description = Some("v1".into());
        let mut v2 = v1.clone();
        v2.description = Some("v2".into());

        let plan = SyncPlan::build(&ns, &[v2], &[stored(&ns, &v1)]).unwrap();

        assert_eq!(plan.counts(), (0, 1, 0));
        assert_eq!(plan.to_update[0].changes.len(), 1);
        assert_eq!(plan.to_update[0].changes[0].field, Field::Description);
    }

    #[test]
    fn test_matching_race_is_unchanged() {
        let ns = Namespace::default();
        let event = race("Race A", "2025-06-01T08:00:00-05:00");

        let plan = SyncPlan::build(&ns, &[event.clone()], &[stored(&ns, &event)]).unwrap();

        assert!(plan.is_empty());
        assert_eq!(plan.unchanged.len(), 1);
        assert_eq!(plan.len(), 1);
    }

    #[test]
    fn test_reserialized_remote_is_unchanged() {
        let ns = Namespace::default();
        let mut declared = race("Race A", "2025-06-01T08:00:00-05:00");
        declared.end = Some(DateTime::parse_from_rfc3339("2025-06-01T14:00:00-05:00").unwrap());

        let mut remote = stored(&ns, &declared);
        remote.event.start = DateTime::parse_from_rfc3339("2025-06-01T13:00:00Z").unwrap();
        remote.event.end = Some(DateTime::parse_from_rfc3339("2025-06-01T19:00:00Z").unwrap());
        remote.event.description = Some(String::new());

        let plan = SyncPlan::build(&ns, &[declared], &[remote]).unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn test_identity_change_is_delete_plus_create() {
        let ns = Namespace::default();
        let old = race("Race A", "2025-06-01T08:00:00-05:00");
        let new = race("Race A", "2025-06-02T08:00:00-05:00");

        let plan = SyncPlan::build(&ns, &[new], &[stored(&ns, &old)]).unwrap();

        assert_eq!(plan.counts(), (1, 0, 1));
    }

    #[test]
    fn test_orphans_are_deleted_and_foreign_events_ignored() {
        let ns = Namespace::default();
        let remote = vec![
            RemoteEvent::new("trailcalX", race("Gone", "2030-01-01T08:00:00Z")),
            RemoteEvent::new("otherprefixZ", race("Dentist", "2030-01-02T08:00:00Z")),
        ];

        let plan = SyncPlan::build(&ns, &[], &remote).unwrap();

        assert_eq!(plan.counts(), (0, 0, 1));
        assert_eq!(plan.to_delete[0].key.as_str(), "trailcalX");
        assert_eq!(plan.len(), 1);
    }

    #[test]
    fn test_buckets_sorted_by_start() {
        let ns = Namespace::default();
        let declared = vec![
            race("Late", "2025-09-01T08:00:00Z"),
            race("Early", "2025-03-01T08:00:00Z"),
            race("Middle", "2025-06-01T08:00:00Z"),
        ];

        let plan = SyncPlan::build(&ns, &declared, &[]).unwrap();
        let names: Vec<_> = plan.to_create.iter().map(|d| d.event.name.as_str()).collect();

        assert_eq!(names, vec!["Early", "Middle", "Late"]);
    }

    #[test]
    fn test_input_order_does_not_change_plan() {
        let ns = Namespace::default();
        let a = race("A", "2025-06-01T08:00:00Z");
        let b = race("B", "2025-06-01T08:00:00Z");
        let c = race("C", "2025-07-01T08:00:00Z");

        let forward = SyncPlan::build(&ns, &[a.clone(), b.clone(), c.clone()], &[]).unwrap();
        let backward = SyncPlan::build(&ns, &[c, b, a], &[]).unwrap();

        let keys = |p: &SyncPlan| p.to_create.iter().map(|d| d.key.clone()).collect::<Vec<_>>();
        assert_eq!(keys(&forward), keys(&backward));
    }

    #[test]
    fn test_duplicate_races_abort_planning() {
        let ns = Namespace::default();
        let declared = vec![
            race("Race A", "2025-06-01T08:00:00-05:00"),
            race("Race A", "2025-06-01T13:00:00Z"),
        ];

        assert!(matches!(
            SyncPlan::build(&ns, &declared, &[]),
            Err(TrailcalError::DuplicateKey { .. })
        ));
    }
}
