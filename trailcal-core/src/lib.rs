//! Core of trailcal: mirrors a declared list of races onto a remote calendar.
//!
//! - `identity` derives stable, namespaced event keys from race content
//! - `diff` classifies declared races against managed remote events
//! - `reconcile` applies a plan through a `remote::RemoteStore`
//! - `source` loads the declared list from `races.json`
//! - `scrape` drafts a `races.json` skeleton from the Freetrail events page

pub mod config;
pub mod diff;
pub mod error;
pub mod event;
pub mod identity;
pub mod normalize;
pub mod reconcile;
pub mod remote;
pub mod scrape;
pub mod source;

pub use error::{StoreError, TrailcalError, TrailcalResult};
pub use event::{DeclaredEvent, RemoteEvent};
