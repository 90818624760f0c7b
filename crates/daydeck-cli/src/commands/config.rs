use clap::Subcommand;
use daydeck_core::{Config, ConfigError};
use serde_json::json;

use super::{print_json, CmdResult};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show the whole configuration
    Show,
    /// Read one entry by dotted key, e.g. `sync.poll_interval_ms`
    Get { key: String },
    /// Change one entry and write the file back
    Set { key: String, value: String },
    /// Write the defaults back to disk
    Reset,
}

pub fn run(action: ConfigAction, config: &Config) -> CmdResult {
    match action {
        ConfigAction::Show => print_json(config),
        ConfigAction::Get { key } => entry(config, &key),
        ConfigAction::Set { key, value } => {
            let mut updated = config.clone();
            updated.set(&key, &value)?;
            entry(&updated, &key)
        }
        ConfigAction::Reset => {
            let defaults = Config::default();
            defaults.save()?;
            print_json(&defaults)
        }
    }
}

fn entry(config: &Config, key: &str) -> CmdResult {
    let value = config
        .get(key)
        .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
    print_json(&json!({ "key": key, "value": value }))
}
