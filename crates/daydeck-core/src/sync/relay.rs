//! Carries writes made by other processes onto the local change bus.
//!
//! Processes sharing one SQLite file have no channel between them, so the
//! relay polls the watched keys and publishes whatever changed since it last
//! looked. Writes announced on the local bus are recorded as seen and are not
//! published a second time.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, warn};
use uuid::Uuid;

use super::bus::{Change, ChangeBus, ChangeSubscription, StorageEvent};
use crate::storage::{LocalStore, StorageBackend};

pub struct PollingRelay {
    backend: Arc<dyn StorageBackend>,
    bus: ChangeBus,
    local: ChangeSubscription,
    keys: Vec<String>,
    last_seen: HashMap<String, Option<String>>,
}

impl PollingRelay {
    /// Relay for `keys` of `store`. The current values become the baseline,
    /// so only later changes are published.
    pub fn new<I, S>(store: &LocalStore, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let backend = store.backend();
        let local = store.subscribe();
        let keys: Vec<String> = keys.into_iter().map(Into::into).collect();
        let last_seen = keys
            .iter()
            .map(|k| (k.clone(), backend.get_item(k).ok().flatten()))
            .collect();
        Self {
            backend,
            bus: store.bus().clone(),
            local,
            keys,
            last_seen,
        }
    }

    fn absorb_local_writes(&mut self) {
        while let Some(change) = self.local.try_next() {
            if let Change::Updated(event) = change {
                if let Some(seen) = self.last_seen.get_mut(&event.key) {
                    *seen = event.new_value;
                }
            }
        }
    }

    /// Check every watched key once. Returns how many changes were published.
    pub fn poll_once(&mut self) -> usize {
        self.absorb_local_writes();
        let mut published = 0;
        for key in &self.keys {
            let current = match self.backend.get_item(key) {
                Ok(v) => v,
                Err(e) => {
                    warn!(key = %key, error = %e, "relay poll failed");
                    continue;
                }
            };
            let seen = self.last_seen.entry(key.clone()).or_default();
            if *seen == current {
                continue;
            }
            *seen = current.clone();
            self.bus.publish(StorageEvent {
                key: key.clone(),
                new_value: current,
                origin: Uuid::nil(),
            });
            published += 1;
        }
        // Our own publications are already recorded.
        self.absorb_local_writes();
        if published > 0 {
            debug!(published, "relayed external changes");
        }
        published
    }

    /// Poll every `period` on a background task until the handle is aborted.
    pub fn spawn(mut self, period: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                self.poll_once();
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Theme;
    use crate::storage::{Binding, ThemeKey};

    #[test]
    fn external_write_is_published_once() {
        let backend: Arc<dyn StorageBackend> = Arc::new(crate::storage::MemoryBackend::new());
        let ours = LocalStore::new(Arc::clone(&backend));
        // Same data, separate bus: another process.
        let theirs = LocalStore::new(Arc::clone(&backend));

        let mut relay = PollingRelay::new(&ours, ["theme"]);
        let mut theme = Binding::<ThemeKey>::new(&ours);

        theirs.write::<ThemeKey>(&Theme::Dark);
        assert_eq!(relay.poll_once(), 1);
        assert!(theme.poll_changes());
        assert_eq!(*theme.get(), Theme::Dark);
        assert_eq!(relay.poll_once(), 0);
    }

    #[test]
    fn local_writes_are_not_echoed() {
        let ours = LocalStore::in_memory();
        let mut relay = PollingRelay::new(&ours, ["theme"]);
        ours.write::<ThemeKey>(&Theme::Light);
        assert_eq!(relay.poll_once(), 0);
    }

    #[test]
    fn external_removal_is_published_as_null() {
        let backend: Arc<dyn StorageBackend> = Arc::new(crate::storage::MemoryBackend::new());
        let ours = LocalStore::new(Arc::clone(&backend));
        let theirs = LocalStore::new(Arc::clone(&backend));
        theirs.write::<ThemeKey>(&Theme::Dark);

        let mut relay = PollingRelay::new(&ours, ["theme"]);
        let mut sub = ours.subscribe();
        theirs.remove::<ThemeKey>();
        assert_eq!(relay.poll_once(), 1);
        match sub.try_next() {
            Some(Change::Updated(event)) => assert!(event.new_value.is_none()),
            other => panic!("unexpected {other:?}"),
        }
    }
}
