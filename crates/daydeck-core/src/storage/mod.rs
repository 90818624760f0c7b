pub mod backend;
pub mod binding;
pub mod config;
pub mod database;
pub mod keys;
pub mod store;

pub use backend::{MemoryBackend, StorageBackend};
pub use binding::Binding;
pub use config::Config;
pub use database::SqliteBackend;
pub use keys::{
    AlarmsKey, CalendarEventsKey, NotesKey, SettingsKey, StorageKey, ThemeKey, TimersKey,
    WorldClocksKey,
};
pub use store::LocalStore;

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns `~/.config/daydeck[-dev]/` based on DAYDECK_ENV.
///
/// Set DAYDECK_ENV=dev to use the development data directory, or
/// DAYDECK_HOME to point at an explicit directory (tests, portable installs).
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("DAYDECK_HOME") {
        Some(home) => PathBuf::from(home),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("DAYDECK_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("daydeck-dev")
            } else {
                base_dir.join("daydeck")
            }
        }
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
