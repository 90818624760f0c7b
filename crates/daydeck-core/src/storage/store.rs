//! Typed read/write over a storage backend, with change publication.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};
use uuid::Uuid;

use super::backend::{MemoryBackend, StorageBackend};
use super::keys::StorageKey;
use crate::error::StoreError;
use crate::sync::{ChangeBus, ChangeSubscription, StorageEvent};

/// One store context.
///
/// Contexts that share a backend and a bus (see [`LocalStore::sibling`])
/// behave like same-origin browsing contexts: a write in one is persisted
/// and then announced to all of them.
#[derive(Clone)]
pub struct LocalStore {
    backend: Arc<dyn StorageBackend>,
    bus: ChangeBus,
}

impl fmt::Debug for LocalStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalStore")
            .field("subscribers", &self.bus.subscriber_count())
            .finish_non_exhaustive()
    }
}

impl LocalStore {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self::with_bus(backend, ChangeBus::default())
    }

    pub fn with_bus(backend: Arc<dyn StorageBackend>, bus: ChangeBus) -> Self {
        Self { backend, bus }
    }

    /// Ephemeral store backed by memory.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryBackend::new()))
    }

    /// Another context on the same origin.
    pub fn sibling(&self) -> Self {
        self.clone()
    }

    pub fn bus(&self) -> &ChangeBus {
        &self.bus
    }

    pub fn backend(&self) -> Arc<dyn StorageBackend> {
        Arc::clone(&self.backend)
    }

    /// Current value for `K`.
    ///
    /// Absent keys, backend failures and unparseable values all yield
    /// `K::default_value()`; the last two are logged.
    pub fn read<K: StorageKey>(&self) -> K::Value {
        match self.read_raw(K::KEY) {
            Ok(Some(raw)) => match K::revive(&raw) {
                Ok(value) => value,
                Err(e) => {
                    warn!(key = K::KEY, error = %e, "stored value unreadable, using default");
                    K::default_value()
                }
            },
            Ok(None) => K::default_value(),
            Err(e) => {
                warn!(key = K::KEY, error = %e, "store read failed, using default");
                K::default_value()
            }
        }
    }

    /// Serialized value stored under `key`.
    pub fn read_raw(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.backend.get_item(key)
    }

    /// Persist `value` and announce it. Returns `false` when the value could
    /// not be persisted, in which case nothing is published.
    pub fn write<K: StorageKey>(&self, value: &K::Value) -> bool {
        self.write_as::<K>(Uuid::nil(), value)
    }

    pub(crate) fn write_as<K: StorageKey>(&self, origin: Uuid, value: &K::Value) -> bool {
        match self.persist::<K>(value) {
            Ok(raw) => {
                let seen = self.bus.publish(StorageEvent {
                    key: K::KEY.to_string(),
                    new_value: Some(raw),
                    origin,
                });
                debug!(key = K::KEY, subscribers = seen, "value persisted");
                true
            }
            Err(e) => {
                warn!(key = K::KEY, error = %e, "store write failed");
                false
            }
        }
    }

    fn persist<K: StorageKey>(&self, value: &K::Value) -> Result<String, StoreError> {
        let raw = serde_json::to_string(value).map_err(|source| StoreError::Serialize {
            key: K::KEY.to_string(),
            source,
        })?;
        self.backend.set_item(K::KEY, &raw)?;
        Ok(raw)
    }

    /// Delete the stored value; readers fall back to the default.
    pub fn remove<K: StorageKey>(&self) -> bool {
        match self.backend.remove_item(K::KEY) {
            Ok(()) => {
                self.bus.publish(StorageEvent {
                    key: K::KEY.to_string(),
                    new_value: None,
                    origin: Uuid::nil(),
                });
                true
            }
            Err(e) => {
                warn!(key = K::KEY, error = %e, "store remove failed");
                false
            }
        }
    }

    pub fn subscribe(&self) -> ChangeSubscription {
        self.bus.subscribe()
    }

    pub fn subscribe_key<K: StorageKey>(&self) -> ChangeSubscription {
        self.bus.subscribe_key(K::KEY)
    }
}
