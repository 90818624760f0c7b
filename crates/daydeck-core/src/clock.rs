//! World clock rendering.
//!
//! Zones are resolved on every render, so a stored clock with an unknown
//! identifier shows a placeholder instead of failing the whole wall.

use std::collections::HashMap;
use std::ops::ControlFlow;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Timelike, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::error::{CoreError, Result, ValidationError};
use crate::models::{parse_zone, WorldClock, WorldClockDraft};
use crate::storage::{Binding, LocalStore, WorldClocksKey};
use crate::timer::{TickerArena, DEFAULT_PERIOD};

pub const INVALID_TIMEZONE: &str = "Invalid Timezone";
pub const PLACEHOLDER_TIME: &str = "--:--:--";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClockReading {
    pub id: String,
    pub label: String,
    pub timezone: String,
    /// `hh:mm:ss AM`, or the placeholder when the zone is unknown.
    pub display: String,
    /// Local hour in `[6, 18)`.
    pub is_day: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Wall time of `clock` at `now`.
pub fn read_clock(clock: &WorldClock, now: DateTime<Utc>) -> ClockReading {
    let (display, is_day, error) = match parse_zone(&clock.timezone) {
        Some(tz) => {
            let local = now.with_timezone(&tz);
            let hour = local.hour();
            (
                local.format("%I:%M:%S %p").to_string(),
                (6..18).contains(&hour),
                None,
            )
        }
        None => (
            PLACEHOLDER_TIME.to_string(),
            false,
            Some(INVALID_TIMEZONE.to_string()),
        ),
    };
    ClockReading {
        id: clock.id.clone(),
        label: clock.label.clone(),
        timezone: clock.timezone.clone(),
        display,
        is_day,
        error,
    }
}

type Readings = Arc<Mutex<HashMap<String, ClockReading>>>;

/// The `world-clocks` collection with one refresher per clock.
pub struct ClockWall {
    clocks: Binding<WorldClocksKey>,
    readings: Readings,
    arena: TickerArena,
    period: Duration,
    started: bool,
}

impl ClockWall {
    pub fn new(store: &LocalStore) -> Self {
        Self::with_period(store, DEFAULT_PERIOD)
    }

    pub fn with_period(store: &LocalStore, period: Duration) -> Self {
        let clocks: Binding<WorldClocksKey> = Binding::new(store);
        let now = Utc::now();
        let readings = clocks
            .get()
            .iter()
            .map(|c| (c.id.clone(), read_clock(c, now)))
            .collect();
        Self {
            clocks,
            readings: Arc::new(Mutex::new(readings)),
            arena: TickerArena::new(),
            period,
            started: false,
        }
    }

    pub fn clocks(&mut self) -> Vec<WorldClock> {
        self.clocks.poll_changes();
        self.clocks.snapshot()
    }

    /// Start refreshers for every stored clock. Needs a tokio runtime.
    pub fn start(&mut self) {
        self.started = true;
        for clock in self.clocks() {
            self.spawn_refresher(clock);
        }
    }

    /// Add a clock. The zone must resolve at submission time and is stored
    /// under its canonical name.
    pub fn add(&mut self, draft: WorldClockDraft) -> Result<WorldClock> {
        let mut clock = WorldClock::from_draft(draft)?;
        let Some(tz) = parse_zone(&clock.timezone) else {
            warn!(timezone = %clock.timezone, "rejected unknown timezone");
            return Err(ValidationError::invalid(
                "timezone",
                "Please enter a valid IANA timezone name (e.g., America/New_York).",
            )
            .into());
        };
        clock.timezone = tz.name().to_string();
        self.clocks.poll_changes();
        self.clocks.update(|list| list.push(clock.clone()));
        self.store_reading(read_clock(&clock, Utc::now()));
        if self.started {
            self.spawn_refresher(clock.clone());
        }
        info!(id = %clock.id, timezone = %clock.timezone, "world clock added");
        Ok(clock)
    }

    pub fn remove(&mut self, id: &str) -> Result<()> {
        self.arena.cancel(id);
        self.clocks.poll_changes();
        if !self.clocks.get().iter().any(|c| c.id == id) {
            return Err(CoreError::not_found("world clock", id));
        }
        self.clocks.update(|list| list.retain(|c| c.id != id));
        self.readings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id);
        Ok(())
    }

    /// Latest readings in collection order. Clocks added by another context
    /// are rendered on the spot; once started, they also gain a refresher,
    /// and clocks removed elsewhere lose theirs.
    pub fn readings(&mut self) -> Vec<ClockReading> {
        let clocks = self.clocks();
        if self.started {
            for clock in &clocks {
                if !self.arena.is_active(&clock.id) {
                    self.spawn_refresher(clock.clone());
                }
            }
        }
        let mut readings = self.readings.lock().unwrap_or_else(PoisonError::into_inner);
        let arena = &mut self.arena;
        readings.retain(|id, _| {
            let kept = clocks.iter().any(|c| &c.id == id);
            if !kept {
                arena.cancel(id);
            }
            kept
        });
        clocks
            .iter()
            .map(|c| {
                readings
                    .entry(c.id.clone())
                    .or_insert_with(|| read_clock(c, Utc::now()))
                    .clone()
            })
            .collect()
    }

    pub fn active_refreshers(&self) -> usize {
        self.arena.active_count()
    }

    /// Refresh every reading once, without waiting for the refreshers.
    pub fn refresh_all(&mut self, now: DateTime<Utc>) {
        for clock in self.clocks() {
            self.store_reading(read_clock(&clock, now));
        }
    }

    fn store_reading(&self, reading: ClockReading) {
        self.readings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(reading.id.clone(), reading);
    }

    fn spawn_refresher(&mut self, clock: WorldClock) {
        let readings = Arc::clone(&self.readings);
        let id = clock.id.clone();
        self.arena.spawn(id, self.period, move || {
            let reading = read_clock(&clock, Utc::now());
            readings
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(reading.id.clone(), reading);
            ControlFlow::Continue(())
        });
    }
}
