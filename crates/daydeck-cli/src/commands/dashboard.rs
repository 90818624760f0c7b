use chrono::{Timelike, Utc};
use daydeck_core::models::timer::format_hms;
use daydeck_core::models::Settings;
use daydeck_core::planner::RECENT_NOTES;
use daydeck_core::storage::{SettingsKey, TimersKey};
use daydeck_core::{AlarmBook, Config, Planner};
use serde_json::json;

use super::{open_store, print_json, CmdResult};

/// Greeting, today's alarms, upcoming events, recent notes and running
/// timers in one document.
pub fn run(config: &Config) -> CmdResult {
    let store = open_store(config)?;
    let settings = store.read::<SettingsKey>();
    let tz = settings.timezone();
    let now = Utc::now().with_timezone(&tz);

    let mut planner = Planner::new(&store);
    let mut alarms = AlarmBook::new(&store);
    let timers: Vec<_> = store
        .read::<TimersKey>()
        .into_iter()
        .filter(|t| t.is_running)
        .map(|t| json!({ "id": t.id, "label": t.label, "remaining": format_hms(t.remaining) }))
        .collect();

    print_json(&json!({
        "greeting": format!("{}, {}", Settings::greeting(now.hour()), settings.username),
        "now": now.to_rfc3339(),
        "timezone": settings.default_timezone,
        "alarms": alarms.dashboard(&now),
        "upcomingEvents": planner.upcoming_events(&now),
        "recentNotes": planner.recent_notes(RECENT_NOTES),
        "runningTimers": timers,
    }))
}
