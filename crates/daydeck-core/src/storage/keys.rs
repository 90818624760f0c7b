//! Typed storage keys and their revival rules.
//!
//! Each persisted collection is its own key type. Reading goes through
//! `StorageKey::revive`, so a collection whose fields need reconstruction
//! after JSON parsing declares that rule here, next to its key name.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::models::{Alarm, CalendarEvent, Note, Settings, Theme, Timer, WorldClock};

pub trait StorageKey: Send + Sync + 'static {
    /// Backend key the collection is stored under.
    const KEY: &'static str;

    type Value: Serialize + DeserializeOwned + Clone + Send + Sync + 'static;

    /// Value used when the key is absent or cannot be parsed.
    fn default_value() -> Self::Value;

    /// Rebuilds a typed value from its serialized form.
    fn revive(raw: &str) -> Result<Self::Value, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

pub struct AlarmsKey;
pub struct TimersKey;
pub struct NotesKey;
pub struct CalendarEventsKey;
pub struct WorldClocksKey;
pub struct SettingsKey;
pub struct ThemeKey;

impl StorageKey for AlarmsKey {
    const KEY: &'static str = "alarms";
    type Value = Vec<Alarm>;

    fn default_value() -> Self::Value {
        Vec::new()
    }
}

impl StorageKey for TimersKey {
    const KEY: &'static str = "timers";
    type Value = Vec<Timer>;

    fn default_value() -> Self::Value {
        Vec::new()
    }
}

impl StorageKey for NotesKey {
    const KEY: &'static str = "notes";
    type Value = Vec<Note>;

    fn default_value() -> Self::Value {
        Vec::new()
    }
}

impl StorageKey for WorldClocksKey {
    const KEY: &'static str = "world-clocks";
    type Value = Vec<WorldClock>;

    fn default_value() -> Self::Value {
        Vec::new()
    }
}

impl StorageKey for SettingsKey {
    const KEY: &'static str = "settings";
    type Value = Settings;

    fn default_value() -> Self::Value {
        Settings::default()
    }
}

impl StorageKey for ThemeKey {
    const KEY: &'static str = "theme";
    type Value = Theme;

    fn default_value() -> Self::Value {
        Theme::System
    }
}

impl StorageKey for CalendarEventsKey {
    const KEY: &'static str = "calendarEvents";
    type Value = Vec<CalendarEvent>;

    fn default_value() -> Self::Value {
        Vec::new()
    }

    /// Event instants are reconstructed from either RFC 3339 strings, naive
    /// `YYYY-MM-DDTHH:MM[:SS]` strings (taken as UTC) or epoch milliseconds.
    /// Records whose instants cannot be reconstructed are dropped and logged;
    /// the rest of the collection survives.
    fn revive(raw: &str) -> Result<Self::Value, serde_json::Error> {
        let records: Vec<Value> = serde_json::from_str(raw)?;
        let mut events = Vec::with_capacity(records.len());
        for mut record in records {
            let revived = ["start", "end"].iter().all(|field| {
                let Some(slot) = record.get_mut(*field) else {
                    return false;
                };
                match revive_instant(slot) {
                    Some(instant) => {
                        *slot = Value::String(instant.to_rfc3339());
                        true
                    }
                    None => false,
                }
            });
            if !revived {
                warn!(key = Self::KEY, id = ?record.get("id"), "dropping event with unreadable start/end");
                continue;
            }
            match serde_json::from_value::<CalendarEvent>(record) {
                Ok(event) => events.push(event),
                Err(e) => warn!(key = Self::KEY, error = %e, "dropping malformed event record"),
            }
        }
        Ok(events)
    }
}

fn revive_instant(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
                    .iter()
                    .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                    .map(|naive| naive.and_utc())
            }),
        Value::Number(n) => n
            .as_i64()
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_revival_is_plain_json() {
        let alarms = AlarmsKey::revive(
            r#"[{"id":"a","time":"07:00","label":"","days":["Mon"],"isEnabled":true,"createdAt":0}]"#,
        )
        .unwrap();
        assert_eq!(alarms.len(), 1);
        assert_eq!(alarms[0].time.to_string(), "07:00");
    }

    #[test]
    fn calendar_revival_accepts_mixed_instant_forms() {
        let raw = r#"[
            {"id":"e1","title":"Iso","start":"2024-05-10T09:00:00.000Z","end":"2024-05-10T10:00:00+02:00","createdAt":1},
            {"id":"e2","title":"Millis","start":1715331600000,"end":1715335200000,"createdAt":2},
            {"id":"e3","title":"Naive","start":"2024-05-10T09:00","end":"2024-05-10T09:30:00","createdAt":3}
        ]"#;
        let events = CalendarEventsKey::revive(raw).unwrap();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].end.to_rfc3339(), "2024-05-10T08:00:00+00:00");
        assert_eq!(events[1].start.timestamp_millis(), 1_715_331_600_000);
        assert_eq!(events[2].start.to_rfc3339(), "2024-05-10T09:00:00+00:00");
    }

    #[test]
    fn calendar_revival_drops_only_broken_records() {
        let raw = r#"[
            {"id":"bad","title":"Broken","start":"yesterday-ish","end":"2024-05-10T10:00:00Z","createdAt":1},
            {"id":"ok","title":"Fine","start":"2024-05-10T09:00:00Z","end":"2024-05-10T10:00:00Z","createdAt":2}
        ]"#;
        let events = CalendarEventsKey::revive(raw).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].id, "ok");
    }

    #[test]
    fn calendar_revival_rejects_non_array() {
        assert!(CalendarEventsKey::revive(r#"{"not":"a list"}"#).is_err());
    }
}
