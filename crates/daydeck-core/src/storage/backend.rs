//! Synchronous key/value storage API underneath the typed store.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use crate::error::StoreError;

/// A synchronous string key/value store.
///
/// Every context that shares one backend instance (or one database file)
/// sees the same data. Implementations must be cheap enough to call on every
/// write; there is no batching.
pub trait StorageBackend: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError>;

    fn remove_item(&self, key: &str) -> Result<(), StoreError>;

    /// All stored keys, sorted.
    fn keys(&self) -> Result<Vec<String>, StoreError>;
}

/// In-process backend.
///
/// An optional byte quota makes writes fail the way a full browser storage
/// area does, which lets callers exercise the optimistic-write path.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    items: Mutex<HashMap<String, String>>,
    quota_bytes: Option<usize>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend that rejects writes once keys plus values exceed `bytes`.
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            items: Mutex::new(HashMap::new()),
            quota_bytes: Some(bytes),
        }
    }
}

impl StorageBackend for MemoryBackend {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        let items = self.items.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut items = self.items.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(quota) = self.quota_bytes {
            let used: usize = items
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            if used + key.len() + value.len() > quota {
                return Err(StoreError::WriteRejected {
                    key: key.to_string(),
                    message: format!("quota of {quota} bytes exceeded"),
                });
            }
        }
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StoreError> {
        let mut items = self.items.lock().unwrap_or_else(PoisonError::into_inner);
        items.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        let items = self.items.lock().unwrap_or_else(PoisonError::into_inner);
        let mut keys: Vec<String> = items.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_remove() {
        let backend = MemoryBackend::new();
        assert!(backend.get_item("alarms").unwrap().is_none());
        backend.set_item("alarms", "[]").unwrap();
        assert_eq!(backend.get_item("alarms").unwrap().as_deref(), Some("[]"));
        backend.remove_item("alarms").unwrap();
        assert!(backend.get_item("alarms").unwrap().is_none());
    }

    #[test]
    fn quota_rejects_oversized_writes() {
        let backend = MemoryBackend::with_quota(16);
        backend.set_item("k", "short").unwrap();
        let err = backend.set_item("k", "much too long for the quota").unwrap_err();
        assert!(matches!(err, StoreError::WriteRejected { .. }));
        assert_eq!(backend.get_item("k").unwrap().as_deref(), Some("short"));
    }
}
