//! Change detection between the declared race list and the remote store.

mod diff_kind;
mod event_diff;
mod sync_plan;

pub use diff_kind::DiffKind;
pub use event_diff::{EventDiff, Field, FieldChange, changed_fields};
pub use sync_plan::SyncPlan;
