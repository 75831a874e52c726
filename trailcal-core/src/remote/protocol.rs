//! Defines the JSON protocol used for communication between trailcal
//! and provider binaries over stdin/stdout.

use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::error::StoreError;
use crate::event::{DeclaredEvent, RemoteEvent};

pub trait ProviderCommand: Serialize {
    type Response: DeserializeOwned;
    fn command() -> Command;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    ListEvents,
    CreateEvent,
    UpdateEvent,
    DeleteEvent,
}

/// Request sent from trailcal to a provider.
#[derive(Debug, Serialize, Deserialize)]
pub struct Request {
    pub command: Command,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// How a provider classifies a failed request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    #[default]
    Unavailable,
    Rejected,
    NotFound,
}

/// Response sent from provider to trailcal.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Response<T> {
    Success {
        data: T,
    },
    Error {
        error: String,
        #[serde(default)]
        kind: ErrorKind,
    },
}

impl<T> Response<T> {
    pub fn into_result(self) -> Result<T, StoreError> {
        match self {
            Response::Success { data } => Ok(data),
            Response::Error { error, kind } => Err(match kind {
                ErrorKind::Unavailable => StoreError::Unavailable(error),
                ErrorKind::Rejected => StoreError::Rejected(error),
                ErrorKind::NotFound => StoreError::NotFound(error),
            }),
        }
    }
}

/// List every event whose id starts with `prefix`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ListEvents {
    /// Provider-specific config (e.g., google_account, google_calendar_id)
    #[serde(flatten)]
    pub remote_config: serde_json::Map<String, serde_json::Value>,
    pub prefix: String,
}

impl ProviderCommand for ListEvents {
    type Response = Vec<RemoteEvent>;
    fn command() -> Command {
        Command::ListEvents
    }
}

/// Create an event under a caller-chosen id.
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateEvent {
    #[serde(flatten)]
    pub remote_config: serde_json::Map<String, serde_json::Value>,
    pub event_id: String,
    pub event: DeclaredEvent,
}

impl ProviderCommand for CreateEvent {
    type Response = RemoteEvent;
    fn command() -> Command {
        Command::CreateEvent
    }
}

/// Replace the payload of an existing event.
#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateEvent {
    #[serde(flatten)]
    pub remote_config: serde_json::Map<String, serde_json::Value>,
    pub event_id: String,
    pub event: DeclaredEvent,
}

impl ProviderCommand for UpdateEvent {
    type Response = RemoteEvent;
    fn command() -> Command {
        Command::UpdateEvent
    }
}

/// Delete an event by ID.
#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteEvent {
    #[serde(flatten)]
    pub remote_config: serde_json::Map<String, serde_json::Value>,
    pub event_id: String,
}

impl ProviderCommand for DeleteEvent {
    type Response = ();
    fn command() -> Command {
        Command::DeleteEvent
    }
}
