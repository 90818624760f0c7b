use chrono::Utc;
use clap::Subcommand;
use daydeck_core::models::WorldClockDraft;
use daydeck_core::storage::{StorageKey, WorldClocksKey};
use daydeck_core::{ClockWall, Config};

use super::{open_store, print_json, watch_keys, CmdResult};

#[derive(Subcommand)]
pub enum ClockAction {
    /// Current time in every world clock
    List,
    /// Add a world clock
    Add {
        /// IANA zone name, e.g. Europe/Berlin
        timezone: String,
        #[arg(long)]
        label: String,
    },
    /// Remove a world clock
    Remove { id: String },
    /// Print readings every tick until Ctrl-C
    Watch,
}

pub async fn run(action: ClockAction, config: &Config) -> CmdResult {
    let store = open_store(config)?;
    let mut wall = ClockWall::with_period(&store, config.tick_period());

    match action {
        ClockAction::List => {
            wall.refresh_all(Utc::now());
            print_json(&wall.readings())?;
        }
        ClockAction::Add { timezone, label } => {
            let clock = wall.add(WorldClockDraft { label, timezone })?;
            print_json(&clock)?;
        }
        ClockAction::Remove { id } => {
            wall.remove(&id)?;
            println!("clock removed");
        }
        ClockAction::Watch => {
            let relay = watch_keys(&store, config, &[WorldClocksKey::KEY]);
            wall.start();
            let mut interval = tokio::time::interval(config.tick_period());
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        println!("{}", serde_json::to_string(&wall.readings())?);
                    }
                    _ = tokio::signal::ctrl_c() => break,
                }
            }
            relay.abort();
        }
    }
    Ok(())
}
