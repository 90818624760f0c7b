//! The timers collection with live countdowns.

use std::ops::ControlFlow;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::broadcast;
use tracing::{debug, info};

use super::ticker::{TickerArena, DEFAULT_PERIOD};
use crate::error::{CoreError, Result};
use crate::events::Event;
use crate::models::{Timer, TimerDraft};
use crate::storage::{Binding, LocalStore, TimersKey};

type SharedTimers = Arc<Mutex<Binding<TimersKey>>>;

/// Owns the `timers` collection of one context and one ticker per running
/// timer. Every tick persists the collection, so other contexts follow the
/// countdown through the change bus.
///
/// Commands that start a ticker must run inside a tokio runtime.
pub struct TimerBoard {
    timers: SharedTimers,
    arena: TickerArena,
    period: Duration,
    events: broadcast::Sender<Event>,
}

impl TimerBoard {
    pub fn new(store: &LocalStore) -> Self {
        Self::with_period(store, DEFAULT_PERIOD)
    }

    pub fn with_period(store: &LocalStore, period: Duration) -> Self {
        let (events, _rx) = broadcast::channel(64);
        Self {
            timers: Arc::new(Mutex::new(Binding::new(store))),
            arena: TickerArena::new(),
            period,
            events,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Binding<TimersKey>> {
        self.timers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Events produced by commands and by tickers.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    fn emit(&self, event: &Event) {
        // Nobody listening is fine.
        let _ = self.events.send(event.clone());
    }

    pub fn list(&self) -> Vec<Timer> {
        let mut timers = self.lock();
        timers.poll_changes();
        timers.snapshot()
    }

    pub fn get(&self, id: &str) -> Option<Timer> {
        self.list().into_iter().find(|t| t.id == id)
    }

    pub fn add(&mut self, draft: TimerDraft) -> Result<Timer> {
        let mut timers = self.lock();
        timers.poll_changes();
        let timer = Timer::from_draft(draft, timers.get().len(), Utc::now())?;
        timers.update(|list| list.push(timer.clone()));
        info!(id = %timer.id, duration = timer.duration, "timer added");
        Ok(timer)
    }

    fn command<R>(&self, id: &str, f: impl FnOnce(&mut Timer) -> R) -> Result<(R, Timer)> {
        let mut timers = self.lock();
        timers.poll_changes();
        let index = timers
            .get()
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| CoreError::not_found("timer", id))?;
        let (out, _) = timers.update(|list| {
            let timer = &mut list[index];
            (f(timer), timer.clone())
        });
        Ok(out)
    }

    pub fn start(&mut self, id: &str) -> Result<Option<Event>> {
        let (event, timer) = self.command(id, Timer::start)?;
        if let Some(event) = &event {
            self.emit(event);
        }
        if timer.is_running && !self.arena.is_active(id) {
            self.spawn_ticker(id);
        }
        Ok(event)
    }

    pub fn pause(&mut self, id: &str) -> Result<Option<Event>> {
        self.arena.cancel(id);
        let (event, _) = self.command(id, Timer::pause)?;
        if let Some(event) = &event {
            self.emit(event);
        }
        Ok(event)
    }

    pub fn toggle(&mut self, id: &str) -> Result<Option<Event>> {
        let running = self.get(id).map(|t| t.is_running);
        match running {
            Some(true) => self.pause(id),
            Some(false) => self.start(id),
            None => Err(CoreError::not_found("timer", id)),
        }
    }

    pub fn reset(&mut self, id: &str) -> Result<Event> {
        self.arena.cancel(id);
        let (event, _) = self.command(id, Timer::reset)?;
        self.emit(&event);
        Ok(event)
    }

    pub fn delete(&mut self, id: &str) -> Result<Event> {
        self.arena.cancel(id);
        let mut timers = self.lock();
        timers.poll_changes();
        if !timers.get().iter().any(|t| t.id == id) {
            return Err(CoreError::not_found("timer", id));
        }
        timers.update(|list| list.retain(|t| t.id != id));
        drop(timers);
        info!(id, "timer deleted");
        let event = Event::TimerDeleted {
            timer_id: id.to_string(),
            at: Utc::now(),
        };
        self.emit(&event);
        Ok(event)
    }

    /// Start tickers for records that are marked running but have none, such
    /// as timers left running by a previous process.
    pub fn resume_running(&mut self) -> usize {
        let running: Vec<String> = self
            .list()
            .into_iter()
            .filter(|t| t.is_running)
            .map(|t| t.id)
            .filter(|id| !self.arena.is_active(id))
            .collect();
        for id in &running {
            self.spawn_ticker(id);
        }
        running.len()
    }

    pub fn active_tickers(&self) -> usize {
        self.arena.active_count()
    }

    fn spawn_ticker(&mut self, id: &str) {
        let timers = Arc::clone(&self.timers);
        let events = self.events.clone();
        let timer_id = id.to_string();
        self.arena.spawn(id, self.period, move || {
            let mut timers = timers.lock().unwrap_or_else(PoisonError::into_inner);
            timers.poll_changes();
            // Paused, reset or deleted elsewhere: report where the record
            // ended up so listeners are not left waiting, then stop.
            let Some(index) = timers
                .get()
                .iter()
                .position(|t| t.id == timer_id && t.is_running)
            else {
                let last = match timers.get().iter().find(|t| t.id == timer_id) {
                    Some(timer) => timer.snapshot(),
                    None => Event::TimerDeleted {
                        timer_id: timer_id.clone(),
                        at: Utc::now(),
                    },
                };
                debug!(id = %timer_id, "timer stopped elsewhere");
                let _ = events.send(last);
                return ControlFlow::Break(());
            };
            let ((event, running), _) = timers.update(|list| {
                let timer = &mut list[index];
                (timer.tick(), timer.is_running)
            });
            if let Some(event) = event {
                if let Event::TimerExpired { label, .. } = &event {
                    info!(id = %timer_id, label = %label, "timer expired");
                }
                let _ = events.send(event);
            }
            if running {
                ControlFlow::Continue(())
            } else {
                ControlFlow::Break(())
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::CountdownState;
    use tokio::time;

    #[tokio::test(start_paused = true)]
    async fn five_second_timer_expires() {
        let store = LocalStore::in_memory();
        let mut board = TimerBoard::new(&store);
        let mut events = board.subscribe();
        let timer = board.add(TimerDraft::from_secs(5)).unwrap();
        board.start(&timer.id).unwrap();

        time::sleep(Duration::from_millis(5_500)).await;

        let done = board.get(&timer.id).unwrap();
        assert_eq!(done.remaining, 0);
        assert!(!done.is_running);
        assert_eq!(done.state(), CountdownState::Expired);
        assert_eq!(board.active_tickers(), 0);

        let mut ticked = 0;
        let mut expired = 0;
        while let Ok(event) = events.try_recv() {
            match event {
                Event::TimerTicked { .. } => ticked += 1,
                Event::TimerExpired { .. } => expired += 1,
                _ => {}
            }
        }
        assert_eq!((ticked, expired), (4, 1));
    }

    #[tokio::test(start_paused = true)]
    async fn pause_freezes_remaining() {
        let store = LocalStore::in_memory();
        let mut board = TimerBoard::new(&store);
        let timer = board.add(TimerDraft::from_secs(10)).unwrap();
        board.start(&timer.id).unwrap();
        time::sleep(Duration::from_millis(2_500)).await;
        board.pause(&timer.id).unwrap();
        time::sleep(Duration::from_secs(5)).await;
        assert_eq!(board.get(&timer.id).unwrap().remaining, 8);
        assert_eq!(board.active_tickers(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn reset_stops_and_restores() {
        let store = LocalStore::in_memory();
        let mut board = TimerBoard::new(&store);
        let timer = board.add(TimerDraft::from_secs(10)).unwrap();
        board.start(&timer.id).unwrap();
        time::sleep(Duration::from_millis(3_500)).await;
        board.reset(&timer.id).unwrap();
        time::sleep(Duration::from_secs(2)).await;
        let t = board.get(&timer.id).unwrap();
        assert_eq!((t.remaining, t.is_running), (10, false));
    }

    #[tokio::test(start_paused = true)]
    async fn pause_from_a_sibling_reaches_listeners() {
        let store = LocalStore::in_memory();
        let mut board = TimerBoard::new(&store);
        let mut events = board.subscribe();
        let timer = board.add(TimerDraft::from_secs(30)).unwrap();
        board.start(&timer.id).unwrap();
        time::sleep(Duration::from_millis(1_500)).await;
        while events.try_recv().is_ok() {}

        let mut other = TimerBoard::new(&store.sibling());
        other.pause(&timer.id).unwrap();
        time::sleep(Duration::from_secs(2)).await;

        match events.try_recv() {
            Ok(Event::StateSnapshot { timer_id, state, .. }) => {
                assert_eq!(timer_id, timer.id);
                assert_eq!(state, CountdownState::Idle);
            }
            other => panic!("expected a snapshot, got {other:?}"),
        }
        assert_eq!(board.active_tickers(), 0);
        assert!(!board.get(&timer.id).unwrap().is_running);
    }

    #[tokio::test(start_paused = true)]
    async fn delete_from_a_sibling_reaches_listeners() {
        let store = LocalStore::in_memory();
        let mut board = TimerBoard::new(&store);
        let mut events = board.subscribe();
        let timer = board.add(TimerDraft::from_secs(30)).unwrap();
        board.start(&timer.id).unwrap();
        while events.try_recv().is_ok() {}

        TimerBoard::new(&store.sibling()).delete(&timer.id).unwrap();
        time::sleep(Duration::from_millis(1_500)).await;

        assert!(matches!(
            events.try_recv(),
            Ok(Event::TimerDeleted { timer_id, .. }) if timer_id == timer.id
        ));
        assert_eq!(board.active_tickers(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn delete_cancels_ticker() {
        let store = LocalStore::in_memory();
        let mut board = TimerBoard::new(&store);
        let timer = board.add(TimerDraft::from_secs(10)).unwrap();
        board.start(&timer.id).unwrap();
        board.delete(&timer.id).unwrap();
        time::sleep(Duration::from_secs(3)).await;
        assert!(board.list().is_empty());
        assert_eq!(board.active_tickers(), 0);
        assert!(board.delete(&timer.id).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn start_on_expired_timer_is_a_no_op() {
        let store = LocalStore::in_memory();
        let mut board = TimerBoard::new(&store);
        let timer = board.add(TimerDraft::from_secs(1)).unwrap();
        board.start(&timer.id).unwrap();
        time::sleep(Duration::from_millis(1_500)).await;
        assert!(board.start(&timer.id).unwrap().is_none());
        assert_eq!(board.active_tickers(), 0);
    }

    #[test]
    fn blank_labels_are_numbered() {
        let store = LocalStore::in_memory();
        let mut board = TimerBoard::new(&store);
        let first = board.add(TimerDraft::from_secs(60)).unwrap();
        let second = board.add(TimerDraft::from_secs(60).with_label("Tea")).unwrap();
        let third = board.add(TimerDraft::from_secs(60)).unwrap();
        assert_eq!(first.label, "Timer 1");
        assert_eq!(second.label, "Tea");
        assert_eq!(third.label, "Timer 3");
        assert!(board.add(TimerDraft::default()).is_err());
    }
}
