use std::time::Duration;

use clap::Subcommand;
use daydeck_core::models::timer::format_hms;
use daydeck_core::models::TimerDraft;
use daydeck_core::storage::{StorageKey, TimersKey};
use daydeck_core::{Config, Event, TimerBoard};
use serde_json::json;
use tokio::sync::broadcast::error::RecvError;

use super::{open_store, print_json, watch_keys, CmdResult};

#[derive(Subcommand)]
pub enum TimerAction {
    /// List timers with their state
    List,
    /// Add a timer
    Add {
        #[arg(long, default_value_t = 0)]
        hours: u64,
        #[arg(long, default_value_t = 0)]
        minutes: u64,
        #[arg(long, default_value_t = 0)]
        seconds: u64,
        /// Defaults to "Timer N"
        #[arg(long, default_value = "")]
        label: String,
    },
    /// Mark a timer running (counts down while `timer run` or `timer watch` is active)
    Start { id: String },
    /// Pause a running timer
    Pause { id: String },
    /// Stop a timer and restore its full duration
    Reset { id: String },
    /// Delete a timer
    Delete { id: String },
    /// Start a timer and count it down in the foreground; Ctrl-C pauses it
    Run { id: String },
    /// Drive every running timer until all of them stop; Ctrl-C pauses them
    Watch,
}

fn listing(board: &TimerBoard) -> Vec<serde_json::Value> {
    board
        .list()
        .iter()
        .map(|t| {
            json!({
                "id": t.id,
                "label": t.label,
                "state": t.state(),
                "remaining": format_hms(t.remaining),
                "duration": format_hms(t.duration),
                "progressPct": t.progress_pct(),
            })
        })
        .collect()
}

pub async fn run(action: TimerAction, config: &Config) -> CmdResult {
    let store = open_store(config)?;
    let mut board = TimerBoard::with_period(&store, config.tick_period());

    match action {
        TimerAction::List => {
            print_json(&listing(&board))?;
        }
        TimerAction::Add {
            hours,
            minutes,
            seconds,
            label,
        } => {
            let draft = TimerDraft {
                hours,
                minutes,
                seconds,
                label,
            };
            print_json(&board.add(draft)?)?;
        }
        TimerAction::Start { id } => match board.start(&id)? {
            Some(event) => print_json(&event)?,
            None => print_json(&board.get(&id).map(|t| t.snapshot()))?,
        },
        TimerAction::Pause { id } => match board.pause(&id)? {
            Some(event) => print_json(&event)?,
            None => print_json(&board.get(&id).map(|t| t.snapshot()))?,
        },
        TimerAction::Reset { id } => print_json(&board.reset(&id)?)?,
        TimerAction::Delete { id } => print_json(&board.delete(&id)?)?,
        TimerAction::Run { id } => {
            let relay = watch_keys(&store, config, &[TimersKey::KEY]);
            let mut events = board.subscribe();
            board.start(&id)?;
            let result = drive(&mut board, &mut events, |b| {
                b.get(&id).is_some_and(|t| t.is_running)
            })
            .await;
            relay.abort();
            result?;
        }
        TimerAction::Watch => {
            let relay = watch_keys(&store, config, &[TimersKey::KEY]);
            let mut events = board.subscribe();
            board.resume_running();
            let result = drive(&mut board, &mut events, |b| {
                b.list().iter().any(|t| t.is_running)
            })
            .await;
            relay.abort();
            result?;
        }
    }
    Ok(())
}

const RECHECK_PERIOD: Duration = Duration::from_secs(1);

/// Print events as JSON lines while `running` holds. Ctrl-C pauses every
/// running timer before returning.
async fn drive(
    board: &mut TimerBoard,
    events: &mut tokio::sync::broadcast::Receiver<Event>,
    running: impl Fn(&TimerBoard) -> bool,
) -> CmdResult {
    // Changes made by other processes arrive through the relay without an
    // event on this board, so `running` is re-checked on a slow beat too.
    let mut recheck = tokio::time::interval(RECHECK_PERIOD);
    while running(&*board) {
        tokio::select! {
            _ = recheck.tick() => continue,
            received = events.recv() => match received {
                Ok(event) => println!("{}", serde_json::to_string(&event)?),
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            },
            _ = tokio::signal::ctrl_c() => {
                let ids: Vec<String> = board
                    .list()
                    .into_iter()
                    .filter(|t| t.is_running)
                    .map(|t| t.id)
                    .collect();
                for id in ids {
                    board.pause(&id)?;
                }
                break;
            }
        }
    }
    // Expiry and pause events are sent before the record is released.
    while let Ok(event) = events.try_recv() {
        println!("{}", serde_json::to_string(&event)?);
    }
    Ok(())
}
