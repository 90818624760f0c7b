//! Alarm evaluation and the alarm collection.
//!
//! There is no firing or acknowledgement state: an alarm is "active" on a
//! given day purely from its enabled flag and weekday set. A one-shot alarm
//! (empty `days`) stays active every day until the user disables it.

use chrono::{DateTime, Datelike, TimeZone, Utc};
use tracing::info;

use crate::error::{CoreError, Result};
use crate::models::{Alarm, AlarmDraft, DayTag};
use crate::storage::{AlarmsKey, Binding, LocalStore};

/// Number of alarms shown in the dashboard summary.
pub const DASHBOARD_ALARMS: usize = 3;

/// Alarms relevant on the local day of `now`, earliest time first.
///
/// An alarm is included iff it is enabled and either has no weekday set or
/// its set contains the weekday of `now` in `now`'s own zone. Alarms with
/// the same time keep their collection order.
pub fn active_alarms<Tz: TimeZone>(alarms: &[Alarm], now: &DateTime<Tz>) -> Vec<Alarm> {
    let today = DayTag::from_weekday(now.weekday());
    let mut active: Vec<Alarm> = alarms
        .iter()
        .filter(|a| a.is_enabled && (a.days.is_empty() || a.days.contains(&today)))
        .cloned()
        .collect();
    active.sort_by_key(|a| a.time);
    active
}

/// The `alarms` collection of one context, kept sorted by time.
pub struct AlarmBook {
    alarms: Binding<AlarmsKey>,
}

impl AlarmBook {
    pub fn new(store: &LocalStore) -> Self {
        Self {
            alarms: Binding::new(store),
        }
    }

    pub fn list(&mut self) -> Vec<Alarm> {
        self.alarms.poll_changes();
        self.alarms.snapshot()
    }

    pub fn get(&mut self, id: &str) -> Option<Alarm> {
        self.list().into_iter().find(|a| a.id == id)
    }

    pub fn create(&mut self, draft: AlarmDraft) -> Result<Alarm> {
        self.alarms.poll_changes();
        let alarm = Alarm::from_draft(draft, Utc::now())?;
        self.alarms.update(|list| {
            // After any equal times, so insertion order breaks ties.
            let at = list.partition_point(|a| a.time <= alarm.time);
            list.insert(at, alarm.clone());
        });
        info!(id = %alarm.id, time = %alarm.time, "alarm created");
        Ok(alarm)
    }

    /// Replace the editable fields of an alarm. The collection is re-sorted
    /// when the time changes.
    pub fn update(&mut self, id: &str, draft: AlarmDraft) -> Result<Alarm> {
        self.alarms.poll_changes();
        let index = self.index_of(id)?;
        let mut edited = self.alarms.get()[index].clone();
        edited.apply(draft)?;
        self.alarms.update(|list| {
            list[index] = edited.clone();
            list.sort_by_key(|a| a.time);
        });
        Ok(edited)
    }

    pub fn toggle(&mut self, id: &str) -> Result<Alarm> {
        self.alarms.poll_changes();
        let index = self.index_of(id)?;
        let (alarm, _) = self.alarms.update(|list| {
            list[index].is_enabled = !list[index].is_enabled;
            list[index].clone()
        });
        info!(id, enabled = alarm.is_enabled, "alarm toggled");
        Ok(alarm)
    }

    pub fn delete(&mut self, id: &str) -> Result<()> {
        self.alarms.poll_changes();
        self.index_of(id)?;
        self.alarms.update(|list| list.retain(|a| a.id != id));
        info!(id, "alarm deleted");
        Ok(())
    }

    pub fn active<Tz: TimeZone>(&mut self, now: &DateTime<Tz>) -> Vec<Alarm> {
        self.alarms.poll_changes();
        active_alarms(self.alarms.get(), now)
    }

    /// First few active alarms for the dashboard.
    pub fn dashboard<Tz: TimeZone>(&mut self, now: &DateTime<Tz>) -> Vec<Alarm> {
        let mut active = self.active(now);
        active.truncate(DASHBOARD_ALARMS);
        active
    }

    fn index_of(&self, id: &str) -> Result<usize> {
        self.alarms
            .get()
            .iter()
            .position(|a| a.id == id)
            .ok_or_else(|| CoreError::not_found("alarm", id))
    }
}
