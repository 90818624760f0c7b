//! Per-entity periodic tasks.

use std::collections::HashMap;
use std::ops::ControlFlow;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::debug;

pub const DEFAULT_PERIOD: Duration = Duration::from_millis(1000);

/// One ticker task per entity id.
///
/// Spawning for an id that already has a ticker replaces it. Cancelling
/// aborts the task: once `cancel` returns the callback is not entered again.
/// Every ticker is aborted when the arena is dropped.
#[derive(Debug, Default)]
pub struct TickerArena {
    handles: HashMap<String, JoinHandle<()>>,
}

impl TickerArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Call `on_tick` every `period`, first after one full period, until it
    /// returns `Break` or the ticker is cancelled.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<F>(&mut self, id: impl Into<String>, period: Duration, mut on_tick: F)
    where
        F: FnMut() -> ControlFlow<()> + Send + 'static,
    {
        let id = id.into();
        self.prune();
        if let Some(previous) = self.handles.remove(&id) {
            previous.abort();
        }
        let task_id = id.clone();
        let handle = tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Burst);
            loop {
                interval.tick().await;
                if on_tick().is_break() {
                    debug!(id = %task_id, "ticker finished");
                    break;
                }
            }
        });
        debug!(id = %id, period_ms = period.as_millis() as u64, "ticker started");
        self.handles.insert(id, handle);
    }

    /// Stop the ticker for `id`. Returns whether one was active.
    pub fn cancel(&mut self, id: &str) -> bool {
        match self.handles.remove(id) {
            Some(handle) => {
                let active = !handle.is_finished();
                handle.abort();
                debug!(id, "ticker cancelled");
                active
            }
            None => false,
        }
    }

    pub fn cancel_all(&mut self) {
        for (_, handle) in self.handles.drain() {
            handle.abort();
        }
    }

    pub fn is_active(&self, id: &str) -> bool {
        self.handles.get(id).is_some_and(|h| !h.is_finished())
    }

    pub fn active_count(&self) -> usize {
        self.handles.values().filter(|h| !h.is_finished()).count()
    }

    fn prune(&mut self) {
        self.handles.retain(|_, h| !h.is_finished());
    }
}

impl Drop for TickerArena {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn counter(arena: &mut TickerArena, id: &str, stop_after: u32) -> Arc<AtomicU32> {
        let count = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&count);
        arena.spawn(id, DEFAULT_PERIOD, move || {
            if c.fetch_add(1, Ordering::SeqCst) + 1 >= stop_after {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });
        count
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_once_per_period() {
        let mut arena = TickerArena::new();
        let count = counter(&mut arena, "a", u32::MAX);
        time::sleep(Duration::from_millis(3_500)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);
        assert!(arena.is_active("a"));
    }

    #[tokio::test(start_paused = true)]
    async fn break_ends_the_ticker() {
        let mut arena = TickerArena::new();
        let count = counter(&mut arena, "a", 2);
        time::sleep(Duration::from_secs(10)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert!(!arena.is_active("a"));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_stops_only_that_id() {
        let mut arena = TickerArena::new();
        let a = counter(&mut arena, "a", u32::MAX);
        let b = counter(&mut arena, "b", u32::MAX);
        time::sleep(Duration::from_millis(1_500)).await;
        assert!(arena.cancel("a"));
        time::sleep(Duration::from_secs(2)).await;
        assert_eq!(a.load(Ordering::SeqCst), 1);
        assert_eq!(b.load(Ordering::SeqCst), 3);
        assert!(!arena.cancel("a"));
    }

    #[tokio::test(start_paused = true)]
    async fn respawn_replaces_previous_ticker() {
        let mut arena = TickerArena::new();
        let first = counter(&mut arena, "a", u32::MAX);
        let second = counter(&mut arena, "a", u32::MAX);
        time::sleep(Duration::from_millis(2_500)).await;
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 2);
        assert_eq!(arena.active_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn drop_aborts_everything() {
        let mut arena = TickerArena::new();
        let count = counter(&mut arena, "a", u32::MAX);
        drop(arena);
        time::sleep(Duration::from_secs(3)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }
}
