//! Publish/subscribe channel of storage change events.

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use uuid::Uuid;

const DEFAULT_CAPACITY: usize = 256;

/// A persisted change: `new_value` is the serialized value that was written,
/// or `None` when the key was removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEvent {
    pub key: String,
    pub new_value: Option<String>,
    /// Writer that produced the change. `Uuid::nil()` for anonymous writers
    /// and for changes relayed from another process.
    pub origin: Uuid,
}

/// What a subscriber sees next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    Updated(StorageEvent),
    /// The subscriber fell behind and `n` events were dropped; re-read
    /// everything it is bound to.
    Missed(u64),
}

/// Broadcast bus shared by every context of one origin. Cloning shares the
/// channel.
#[derive(Debug, Clone)]
pub struct ChangeBus {
    tx: broadcast::Sender<StorageEvent>,
}

impl Default for ChangeBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl ChangeBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Returns the number of subscribers that will see the event.
    pub fn publish(&self, event: StorageEvent) -> usize {
        // No subscribers is not an error: nobody is bound to the key yet.
        self.tx.send(event).unwrap_or(0)
    }

    /// Subscription to every key.
    pub fn subscribe(&self) -> ChangeSubscription {
        ChangeSubscription {
            rx: self.tx.subscribe(),
            key: None,
        }
    }

    /// Subscription filtered to a single key.
    pub fn subscribe_key(&self, key: &str) -> ChangeSubscription {
        ChangeSubscription {
            rx: self.tx.subscribe(),
            key: Some(key.to_string()),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

#[derive(Debug)]
pub struct ChangeSubscription {
    rx: broadcast::Receiver<StorageEvent>,
    key: Option<String>,
}

impl ChangeSubscription {
    fn wants(&self, event: &StorageEvent) -> bool {
        self.key.as_deref().map_or(true, |k| k == event.key)
    }

    /// Next pending change without waiting; `None` when nothing is queued.
    pub fn try_next(&mut self) -> Option<Change> {
        loop {
            match self.rx.try_recv() {
                Ok(event) if self.wants(&event) => return Some(Change::Updated(event)),
                Ok(_) => continue,
                Err(TryRecvError::Lagged(n)) => return Some(Change::Missed(n)),
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }

    /// Waits for the next change; `None` once every publisher is gone.
    pub async fn next(&mut self) -> Option<Change> {
        loop {
            match self.rx.recv().await {
                Ok(event) if self.wants(&event) => return Some(Change::Updated(event)),
                Ok(_) => continue,
                Err(RecvError::Lagged(n)) => return Some(Change::Missed(n)),
                Err(RecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(key: &str, value: &str) -> StorageEvent {
        StorageEvent {
            key: key.to_string(),
            new_value: Some(value.to_string()),
            origin: Uuid::nil(),
        }
    }

    #[test]
    fn key_filter_skips_other_keys() {
        let bus = ChangeBus::default();
        let mut timers = bus.subscribe_key("timers");
        bus.publish(event("alarms", "[]"));
        bus.publish(event("timers", "[1]"));
        match timers.try_next() {
            Some(Change::Updated(e)) => assert_eq!(e.new_value.as_deref(), Some("[1]")),
            other => panic!("unexpected {other:?}"),
        }
        assert!(timers.try_next().is_none());
    }

    #[test]
    fn publish_without_subscribers_is_fine() {
        let bus = ChangeBus::default();
        assert_eq!(bus.publish(event("notes", "[]")), 0);
    }

    #[test]
    fn lagging_subscriber_is_told_to_resync() {
        let bus = ChangeBus::new(2);
        let mut sub = bus.subscribe();
        for i in 0..5 {
            bus.publish(event("alarms", &i.to_string()));
        }
        assert!(matches!(sub.try_next(), Some(Change::Missed(3))));
    }

    #[tokio::test]
    async fn async_next_waits_for_matching_key() {
        let bus = ChangeBus::default();
        let mut sub = bus.subscribe_key("theme");
        let publisher = bus.clone();
        tokio::spawn(async move {
            publisher.publish(event("alarms", "[]"));
            publisher.publish(event("theme", "\"dark\""));
        });
        match sub.next().await {
            Some(Change::Updated(e)) => assert_eq!(e.key, "theme"),
            other => panic!("unexpected {other:?}"),
        }
    }
}
