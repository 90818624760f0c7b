//! A live, typed view of one stored key.

use std::marker::PhantomData;

use tracing::debug;
use uuid::Uuid;

use super::keys::StorageKey;
use super::store::LocalStore;
use crate::sync::{Change, ChangeSubscription};

/// In-memory copy of the value under `K`, kept in step with writes made by
/// other bindings and other contexts on the same bus.
///
/// `set` updates memory before persisting, so a failed write leaves the
/// binding ahead of storage until the next successful write or reload.
pub struct Binding<K: StorageKey> {
    id: Uuid,
    store: LocalStore,
    value: K::Value,
    changes: ChangeSubscription,
    _key: PhantomData<fn() -> K>,
}

impl<K: StorageKey> Binding<K> {
    pub fn new(store: &LocalStore) -> Self {
        // Subscribe before the first read so no write can slip between them.
        let changes = store.subscribe_key::<K>();
        let value = store.read::<K>();
        Self {
            id: Uuid::new_v4(),
            store: store.clone(),
            value,
            changes,
            _key: PhantomData,
        }
    }

    pub fn get(&self) -> &K::Value {
        &self.value
    }

    pub fn snapshot(&self) -> K::Value {
        self.value.clone()
    }

    pub fn store(&self) -> &LocalStore {
        &self.store
    }

    /// Replace the value and persist it. Returns whether the write reached
    /// storage.
    pub fn set(&mut self, value: K::Value) -> bool {
        self.value = value;
        self.store.write_as::<K>(self.id, &self.value)
    }

    /// Mutate the value in place and persist the result.
    pub fn update<R>(&mut self, f: impl FnOnce(&mut K::Value) -> R) -> (R, bool) {
        let out = f(&mut self.value);
        let persisted = self.store.write_as::<K>(self.id, &self.value);
        (out, persisted)
    }

    pub fn reload(&mut self) {
        self.value = self.store.read::<K>();
    }

    /// Apply every queued change. Returns `true` when the value was re-read.
    ///
    /// Removals (`new_value` of `None`) and this binding's own writes are
    /// ignored; a lagged subscription forces a re-read.
    pub fn poll_changes(&mut self) -> bool {
        let mut stale = false;
        while let Some(change) = self.changes.try_next() {
            stale |= self.is_relevant(&change);
        }
        if stale {
            self.reload();
        }
        stale
    }

    /// Wait until another writer changes the key, then re-read it.
    ///
    /// Returns `false` once the bus is gone.
    pub async fn changed(&mut self) -> bool {
        while let Some(change) = self.changes.next().await {
            if self.is_relevant(&change) {
                self.reload();
                return true;
            }
        }
        false
    }

    fn is_relevant(&self, change: &Change) -> bool {
        match change {
            Change::Updated(event) => {
                event.key == K::KEY && event.new_value.is_some() && event.origin != self.id
            }
            Change::Missed(n) => {
                debug!(key = K::KEY, missed = n, "binding lagged, re-reading");
                true
            }
        }
    }
}
