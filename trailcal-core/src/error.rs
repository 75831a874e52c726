//! Error types for trailcal.

use thiserror::Error;

/// Errors that abort a whole reconciliation pass.
///
/// Anything returned as a `TrailcalError` happens before the first remote
/// mutation, so a failed run never leaves the store half-applied.
#[derive(Error, Debug)]
pub enum TrailcalError {
    #[error("Invalid event data: {0}")]
    InvalidEventData(String),

    #[error("Duplicate key {key}: '{first}' and '{second}' derive the same identity")]
    DuplicateKey {
        key: String,
        first: String,
        second: String,
    },

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Provider '{name}' not found in PATH. Install it with:\n  cargo install {binary}")]
    ProviderNotInstalled { name: String, binary: String },

    #[error("Could not scrape race list: {0}")]
    Scrape(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for trailcal operations.
pub type TrailcalResult<T> = Result<T, TrailcalError>;

/// Errors reported by a remote store for a single operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Transport, auth or timeout failure.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The store refused the payload (schema or validation failure).
    #[error("store rejected request: {0}")]
    Rejected(String),

    #[error("event not found: {0}")]
    NotFound(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<StoreError> for TrailcalError {
    /// Any failure while listing is fatal to the run.
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(msg) | StoreError::Rejected(msg) => {
                TrailcalError::StoreUnavailable(msg)
            }
            StoreError::NotFound(what) => {
                TrailcalError::StoreUnavailable(format!("calendar not found: {what}"))
            }
        }
    }
}
