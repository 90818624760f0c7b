use clap::Subcommand;
use daydeck_core::models::{parse_zone, Settings, Theme};
use daydeck_core::storage::{SettingsKey, ThemeKey};
use daydeck_core::{Config, LocalStore};

use super::{open_store, print_json, CmdResult};

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Show the stored user settings (the API key is masked)
    Show,
    /// Set one field: username, theme, gemini-api-key or default-timezone
    Set { field: String, value: String },
}

fn masked(settings: &Settings) -> serde_json::Value {
    let mut value = serde_json::to_value(settings).unwrap_or_default();
    if !settings.gemini_api_key.is_empty() {
        value["geminiApiKey"] = "********".into();
    }
    value
}

fn apply(store: &LocalStore, field: &str, value: &str) -> CmdResult {
    let mut settings = store.read::<SettingsKey>();
    match field {
        "username" => settings.username = value.trim().to_string(),
        "theme" => {
            let theme: Theme = value.parse()?;
            settings.theme = theme;
            store.write::<ThemeKey>(&theme);
        }
        "gemini-api-key" => settings.gemini_api_key = value.trim().to_string(),
        "default-timezone" => {
            let zone = parse_zone(value)
                .ok_or_else(|| format!("unknown timezone: {}", value.trim()))?;
            settings.default_timezone = zone.name().to_string();
        }
        other => return Err(format!("unknown settings field: {other}").into()),
    }
    if !store.write::<SettingsKey>(&settings) {
        return Err("settings could not be saved".into());
    }
    Ok(())
}

pub fn run(action: SettingsAction, config: &Config) -> CmdResult {
    let store = open_store(config)?;
    match action {
        SettingsAction::Show => {
            print_json(&masked(&store.read::<SettingsKey>()))?;
        }
        SettingsAction::Set { field, value } => {
            apply(&store, &field, &value)?;
            println!("ok");
        }
    }
    Ok(())
}
