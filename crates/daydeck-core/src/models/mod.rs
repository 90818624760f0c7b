//! Plain data records persisted by the store.
//!
//! Every record serializes with camelCase field names so the stored JSON keeps
//! the same shape in every collection. `createdAt`/`updatedAt` are epoch
//! milliseconds; calendar instants are RFC 3339 strings.

use chrono::{DateTime, SubsecRound, Utc};

pub mod alarm;
pub mod calendar;
pub mod note;
pub mod settings;
pub mod timer;
pub mod world_clock;

pub use alarm::{Alarm, AlarmDraft, ClockTime, DayTag};
pub use calendar::{CalendarEvent, EventDraft};
pub use note::{Note, NoteDraft};
pub use settings::{Settings, Theme};
pub use timer::{Timer, TimerDraft};
pub use world_clock::{parse_zone, WorldClock, WorldClockDraft};

/// `at` cut to the millisecond precision `createdAt`/`updatedAt` are stored
/// with, so a record reads back equal to the one that was written.
pub fn to_millis(at: DateTime<Utc>) -> DateTime<Utc> {
    at.trunc_subsecs(3)
}

pub fn now_ms() -> DateTime<Utc> {
    to_millis(Utc::now())
}

/// Fresh unique entity id.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Trims a free-text field and maps blank input to `None`.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
