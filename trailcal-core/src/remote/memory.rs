//! In-process event store.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::{StoreError, StoreResult};
use crate::event::{DeclaredEvent, RemoteEvent};
use crate::identity::DerivedKey;
use crate::remote::RemoteStore;

/// A store call as `MemoryStore` saw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    List(String),
    Create(String),
    Update(String),
    Delete(String),
}

/// A `RemoteStore` held in memory.
///
/// Records every call and can be told to fail specific ids, which makes it
/// the store of choice for exercising the reconciler.
#[derive(Debug, Default)]
pub struct MemoryStore {
    events: Mutex<BTreeMap<String, RemoteEvent>>,
    failures: Mutex<HashMap<String, StoreError>>,
    list_failure: Mutex<Option<StoreError>>,
    calls: Mutex<Vec<StoreCall>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_events(events: impl IntoIterator<Item = RemoteEvent>) -> Self {
        let store = Self::new();
        for event in events {
            store.insert(event);
        }
        store
    }

    /// Put an event in place without recording a call.
    pub fn insert(&self, event: RemoteEvent) {
        lock(&self.events).insert(event.id.clone(), event);
    }

    /// Make every mutation of `id` fail with `error`.
    pub fn fail_on(&self, id: &str, error: StoreError) {
        lock(&self.failures).insert(id.to_string(), error);
    }

    /// Make listing fail with `error`.
    pub fn fail_listing(&self, error: StoreError) {
        *lock(&self.list_failure) = Some(error);
    }

    /// Snapshot of the stored events, ordered by id.
    pub fn events(&self) -> Vec<RemoteEvent> {
        lock(&self.events).values().cloned().collect()
    }

    pub fn get(&self, id: &str) -> Option<RemoteEvent> {
        lock(&self.events).get(id).cloned()
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        lock(&self.calls).clone()
    }

    /// Number of create, update and delete calls received.
    pub fn mutation_count(&self) -> usize {
        lock(&self.calls)
            .iter()
            .filter(|c| !matches!(c, StoreCall::List(_)))
            .count()
    }

    fn record(&self, call: StoreCall) {
        lock(&self.calls).push(call);
    }

    fn injected(&self, id: &str) -> StoreResult<()> {
        match lock(&self.failures).get(id) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

impl RemoteStore for MemoryStore {
    async fn list_managed(&self, prefix: &str) -> StoreResult<Vec<RemoteEvent>> {
        self.record(StoreCall::List(prefix.to_string()));

        if let Some(err) = lock(&self.list_failure).clone() {
            return Err(err);
        }

        Ok(lock(&self.events)
            .values()
            .filter(|e| e.id.starts_with(prefix))
            .cloned()
            .collect())
    }

    async fn create(&self, event: &DeclaredEvent, key: &DerivedKey) -> StoreResult<RemoteEvent> {
        self.record(StoreCall::Create(key.to_string()));
        self.injected(key.as_str())?;

        let mut events = lock(&self.events);
        if events.contains_key(key.as_str()) {
            return Err(StoreError::Rejected(format!("duplicate id {key}")));
        }

        let created = RemoteEvent::new(key.as_str(), event.clone());
        events.insert(created.id.clone(), created.clone());
        Ok(created)
    }

    async fn update(&self, key: &DerivedKey, event: &DeclaredEvent) -> StoreResult<RemoteEvent> {
        self.record(StoreCall::Update(key.to_string()));
        self.injected(key.as_str())?;

        let mut events = lock(&self.events);
        let stored = events
            .get_mut(key.as_str())
            .ok_or_else(|| StoreError::NotFound(key.to_string()))?;
        stored.event = event.clone();
        Ok(stored.clone())
    }

    async fn delete(&self, key: &DerivedKey) -> StoreResult<()> {
        self.record(StoreCall::Delete(key.to_string()));
        self.injected(key.as_str())?;

        lock(&self.events)
            .remove(key.as_str())
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }
}
