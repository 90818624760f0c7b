pub mod alarm;
pub mod clock;
pub mod config;
pub mod dashboard;
pub mod event;
pub mod note;
pub mod settings;
pub mod suggest;
pub mod timer;

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use daydeck_core::storage::SettingsKey;
use daydeck_core::{Config, LocalStore, PollingRelay, SqliteBackend};
use serde::Serialize;
use tokio::task::JoinHandle;

pub type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Store context backed by the configured database file.
pub fn open_store(config: &Config) -> Result<LocalStore, Box<dyn std::error::Error>> {
    let backend = SqliteBackend::open_default(&config.storage.database)?;
    Ok(LocalStore::new(Arc::new(backend)))
}

/// Relay writes made by other processes on `keys` into this context.
/// Long-running commands hold the handle and abort it on exit.
pub fn watch_keys(store: &LocalStore, config: &Config, keys: &[&str]) -> JoinHandle<()> {
    PollingRelay::new(store, keys.iter().copied()).spawn(config.poll_interval())
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Zone used to interpret wall-clock input and to pick "today".
pub fn user_timezone(store: &LocalStore) -> chrono_tz::Tz {
    store.read::<SettingsKey>().timezone()
}

/// Accepts `YYYY-MM-DD HH:MM`, `YYYY-MM-DDTHH:MM` or a bare date (midnight).
pub fn parse_local(s: &str) -> Result<NaiveDateTime, String> {
    let s = s.trim();
    ["%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .ok_or_else(|| format!("cannot parse '{s}' as YYYY-MM-DD HH:MM"))
}
