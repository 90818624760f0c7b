//! Countdown state machine.
//!
//! The engine does not use internal threads - the caller is responsible for
//! calling `tick()` once per second while the timer runs (see
//! [`super::TimerBoard`]). State is never stored; it is derived from the
//! persisted record so every context agrees on it.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -(start, remaining > 0)-> Running -(tick)-> Running
//! Running -(pause)-> Idle
//! Running -(remaining reaches 0)-> Expired
//! any -(reset)-> Idle
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::events::Event;
use crate::models::Timer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CountdownState {
    Idle,
    Running,
    /// Reached zero. Only a reset makes the timer usable again.
    Expired,
}

impl CountdownState {
    pub fn of(timer: &Timer) -> Self {
        if timer.remaining == 0 {
            CountdownState::Expired
        } else if timer.is_running {
            CountdownState::Running
        } else {
            CountdownState::Idle
        }
    }
}

impl Timer {
    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> CountdownState {
        CountdownState::of(self)
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            timer_id: self.id.clone(),
            state: self.state(),
            remaining_secs: self.remaining,
            duration_secs: self.duration,
            progress_pct: self.progress_pct(),
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Starting a finished timer does nothing.
    pub fn start(&mut self) -> Option<Event> {
        if self.is_running || self.remaining == 0 {
            return None;
        }
        self.is_running = true;
        Some(Event::TimerStarted {
            timer_id: self.id.clone(),
            remaining_secs: self.remaining,
            at: Utc::now(),
        })
    }

    pub fn pause(&mut self) -> Option<Event> {
        if !self.is_running {
            return None;
        }
        self.is_running = false;
        Some(Event::TimerPaused {
            timer_id: self.id.clone(),
            remaining_secs: self.remaining,
            at: Utc::now(),
        })
    }

    pub fn toggle(&mut self) -> Option<Event> {
        if self.is_running {
            self.pause()
        } else {
            self.start()
        }
    }

    pub fn reset(&mut self) -> Event {
        self.is_running = false;
        self.remaining = self.duration;
        Event::TimerReset {
            timer_id: self.id.clone(),
            duration_secs: self.duration,
            at: Utc::now(),
        }
    }

    /// Advance one second. Returns `None` when the timer is not running.
    ///
    /// A running record that is already at zero (written that way by an
    /// older client, or edited by hand) is stopped without decrementing.
    pub fn tick(&mut self) -> Option<Event> {
        if !self.is_running {
            return None;
        }
        self.remaining = self.remaining.saturating_sub(1).min(self.duration);
        if self.remaining > 0 {
            return Some(Event::TimerTicked {
                timer_id: self.id.clone(),
                remaining_secs: self.remaining,
                at: Utc::now(),
            });
        }
        self.is_running = false;
        Some(Event::TimerExpired {
            timer_id: self.id.clone(),
            label: self.label.clone(),
            at: Utc::now(),
        })
    }
}
