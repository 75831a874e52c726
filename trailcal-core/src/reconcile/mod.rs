//! Reconciliation passes: fetch, diff, apply.

mod report;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};

use crate::diff::{DiffKind, EventDiff, SyncPlan};
use crate::error::TrailcalResult;
use crate::event::DeclaredEvent;
use crate::identity::{self, Namespace};
use crate::remote::RemoteStore;

pub use report::{
    FailureKind, ItemFailure, ItemOutcome, ReportCounts, ReportItem, RunOutcome, SyncReport,
};

/// Mirrors a declared race list onto a remote store under one namespace.
pub struct Reconciler<'a, S> {
    store: &'a S,
    namespace: Namespace,
    cancel: Option<Arc<AtomicBool>>,
}

impl<'a, S: RemoteStore> Reconciler<'a, S> {
    pub fn new(store: &'a S, namespace: Namespace) -> Self {
        Reconciler {
            store,
            namespace,
            cancel: None,
        }
    }

    /// Stop applying further items once `flag` is set.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Validate the declared list, fetch managed events and classify them.
    ///
    /// Nothing is mutated. Bad input fails before the store is contacted.
    pub async fn plan(&self, declared: &[DeclaredEvent]) -> TrailcalResult<SyncPlan> {
        identity::derive_all(&self.namespace, declared)?;

        let remote = self.store.list_managed(self.namespace.prefix()).await?;
        tracing::info!(
            declared = declared.len(),
            remote = remote.len(),
            prefix = %self.namespace,
            "fetched managed events"
        );

        let plan = SyncPlan::build(&self.namespace, declared, &remote)?;
        let (create, update, delete) = plan.counts();
        tracing::info!(
            create,
            update,
            delete,
            unchanged = plan.unchanged.len(),
            "planned sync"
        );

        Ok(plan)
    }

    /// Apply every item of `plan`, one store call at a time.
    ///
    /// A failing item is recorded and the pass moves on; orphans that started
    /// before `now` are left in place.
    pub async fn apply(&self, plan: &SyncPlan, now: DateTime<Utc>) -> SyncReport {
        let mut report = SyncReport::default();

        for key in &plan.unchanged {
            report.record_unchanged(key.clone());
        }
        self.apply_items(plan.mutations(), now, &mut report).await;

        report
    }

    /// Apply `diffs` in the order given, recording each outcome.
    async fn apply_items<'d>(
        &self,
        diffs: impl IntoIterator<Item = &'d EventDiff>,
        now: DateTime<Utc>,
        report: &mut SyncReport,
    ) {
        for diff in diffs {
            let outcome = self.apply_one(diff, now).await;
            match &outcome {
                ItemOutcome::Failed { kind, reason } => {
                    tracing::warn!(key = %diff.key, action = %diff.kind, %kind, %reason, "item failed");
                }
                ItemOutcome::SkippedPastOrphan => {
                    tracing::warn!(key = %diff.key, name = %diff.event.name, "leaving past orphan in place");
                }
                other => tracing::debug!(key = %diff.key, outcome = ?other, "item applied"),
            }
            report.record(diff, outcome);
        }
    }

    /// One full pass: plan then apply.
    pub async fn run(
        &self,
        declared: &[DeclaredEvent],
        now: DateTime<Utc>,
    ) -> TrailcalResult<SyncReport> {
        let plan = self.plan(declared).await?;
        Ok(self.apply(&plan, now).await)
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }

    async fn apply_one(&self, diff: &EventDiff, now: DateTime<Utc>) -> ItemOutcome {
        // Leaving a past orphan alone needs no store call, cancelled or not.
        if diff.kind == DiffKind::Delete && diff.event.start_utc() < now {
            return ItemOutcome::SkippedPastOrphan;
        }

        if self.is_cancelled() {
            return ItemOutcome::Failed {
                kind: FailureKind::Cancelled,
                reason: "run cancelled before this item was applied".into(),
            };
        }

        let result = match diff.kind {
            DiffKind::Create => self
                .store
                .create(&diff.event, &diff.key)
                .await
                .map(|_| ItemOutcome::Created),
            DiffKind::Update => self
                .store
                .update(&diff.key, &diff.event)
                .await
                .map(|_| ItemOutcome::Updated),
            DiffKind::Delete => self
                .store
                .delete(&diff.key)
                .await
                .map(|_| ItemOutcome::Deleted),
        };

        result.unwrap_or_else(|err| ItemOutcome::from_store_error(diff.kind, err))
    }
}
