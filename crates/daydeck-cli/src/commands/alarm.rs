use chrono::Utc;
use clap::Subcommand;
use daydeck_core::models::{AlarmDraft, DayTag};
use daydeck_core::{AlarmBook, Config};

use super::{open_store, print_json, user_timezone, CmdResult};

#[derive(Subcommand)]
pub enum AlarmAction {
    /// List alarms (sorted by time)
    List {
        /// Only alarms that apply today
        #[arg(long)]
        active: bool,
    },
    /// Add an alarm
    Add {
        /// Time as HH:MM (24-hour); defaults to five minutes from now
        time: Option<String>,
        #[arg(long, default_value = "")]
        label: String,
        /// Repeat days, e.g. "Mon,Wed,Fri"; omit for a one-shot alarm
        #[arg(long, value_delimiter = ',')]
        days: Vec<DayTag>,
        /// Create the alarm disabled
        #[arg(long)]
        disabled: bool,
    },
    /// Replace an alarm's time, label and days
    Edit {
        id: String,
        time: String,
        #[arg(long, default_value = "")]
        label: String,
        #[arg(long, value_delimiter = ',')]
        days: Vec<DayTag>,
        #[arg(long)]
        disabled: bool,
    },
    /// Enable or disable an alarm
    Toggle { id: String },
    /// Delete an alarm
    Delete { id: String },
}

pub fn run(action: AlarmAction, config: &Config) -> CmdResult {
    let store = open_store(config)?;
    let mut book = AlarmBook::new(&store);

    match action {
        AlarmAction::List { active } => {
            let alarms = if active {
                let now = Utc::now().with_timezone(&user_timezone(&store));
                book.active(&now)
            } else {
                book.list()
            };
            print_json(&alarms)?;
        }
        AlarmAction::Add {
            time,
            label,
            days,
            disabled,
        } => {
            let draft = match time {
                Some(time) => AlarmDraft::new(time),
                None => {
                    let now = Utc::now().with_timezone(&user_timezone(&store));
                    AlarmDraft::prefilled(&now)
                }
            };
            let alarm = book.create(draft.with_label(label).with_days(days).enabled(!disabled))?;
            print_json(&alarm)?;
        }
        AlarmAction::Edit {
            id,
            time,
            label,
            days,
            disabled,
        } => {
            let draft = AlarmDraft::new(time)
                .with_label(label)
                .with_days(days)
                .enabled(!disabled);
            print_json(&book.update(&id, draft)?)?;
        }
        AlarmAction::Toggle { id } => {
            print_json(&book.toggle(&id)?)?;
        }
        AlarmAction::Delete { id } => {
            book.delete(&id)?;
            println!("alarm deleted");
        }
    }
    Ok(())
}
