//! The remote calendar store boundary.

mod memory;
pub mod protocol;
pub mod provider;

use std::collections::HashMap;
use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::error::StoreResult;
use crate::event::{DeclaredEvent, RemoteEvent};
use crate::identity::DerivedKey;
use crate::remote::protocol::{CreateEvent, DeleteEvent, ListEvents, UpdateEvent};
use crate::remote::provider::Provider;

pub use memory::{MemoryStore, StoreCall};

/// A keyed event store reached over the network.
///
/// Every operation touches a single event; nothing is transactional across
/// calls.
pub trait RemoteStore {
    /// All events whose id starts with `prefix`.
    fn list_managed(&self, prefix: &str)
    -> impl Future<Output = StoreResult<Vec<RemoteEvent>>> + Send;

    fn create(
        &self,
        event: &DeclaredEvent,
        key: &DerivedKey,
    ) -> impl Future<Output = StoreResult<RemoteEvent>> + Send;

    /// Fails with `NotFound` when `key` no longer exists remotely.
    fn update(
        &self,
        key: &DerivedKey,
        event: &DeclaredEvent,
    ) -> impl Future<Output = StoreResult<RemoteEvent>> + Send;

    /// `NotFound` means the event is already gone.
    fn delete(&self, key: &DerivedKey) -> impl Future<Output = StoreResult<()>> + Send;
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct RemoteConfig(pub HashMap<String, toml::Value>);

impl From<&RemoteConfig> for serde_json::Map<String, serde_json::Value> {
    fn from(config: &RemoteConfig) -> Self {
        config
            .0
            .iter()
            .filter_map(|(k, v)| serde_json::to_value(v).ok().map(|v| (k.clone(), v)))
            .collect()
    }
}

/// Remote provider configuration (e.g., Google Calendar settings)
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Remote {
    pub provider: Provider,
    #[serde(flatten)]
    pub config: RemoteConfig,
}

impl Remote {
    fn remote_config(&self) -> serde_json::Map<String, serde_json::Value> {
        serde_json::Map::from(&self.config)
    }

    pub fn new(provider: Provider, config: RemoteConfig) -> Self {
        Remote { provider, config }
    }
}

impl RemoteStore for Remote {
    async fn list_managed(&self, prefix: &str) -> StoreResult<Vec<RemoteEvent>> {
        self.provider
            .call(ListEvents {
                remote_config: self.remote_config(),
                prefix: prefix.to_string(),
            })
            .await
    }

    async fn create(&self, event: &DeclaredEvent, key: &DerivedKey) -> StoreResult<RemoteEvent> {
        self.provider
            .call(CreateEvent {
                remote_config: self.remote_config(),
                event_id: key.to_string(),
                event: event.clone(),
            })
            .await
    }

    async fn update(&self, key: &DerivedKey, event: &DeclaredEvent) -> StoreResult<RemoteEvent> {
        self.provider
            .call(UpdateEvent {
                remote_config: self.remote_config(),
                event_id: key.to_string(),
                event: event.clone(),
            })
            .await
    }

    async fn delete(&self, key: &DerivedKey) -> StoreResult<()> {
        self.provider
            .call(DeleteEvent {
                remote_config: self.remote_config(),
                event_id: key.to_string(),
            })
            .await
    }
}
