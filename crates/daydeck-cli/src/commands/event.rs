use chrono::{NaiveDate, Utc};
use clap::{Args, Subcommand};
use daydeck_core::models::EventDraft;
use daydeck_core::{Config, Planner};

use super::{open_store, parse_local, print_json, user_timezone, CmdResult};

/// Event form fields. Times are wall-clock values in the default timezone.
#[derive(Args)]
pub struct EventFields {
    #[arg(long)]
    title: String,
    /// Start as YYYY-MM-DD HH:MM
    #[arg(long, value_parser = parse_local)]
    start: chrono::NaiveDateTime,
    /// End as YYYY-MM-DD HH:MM; defaults to the start
    #[arg(long, value_parser = parse_local)]
    end: Option<chrono::NaiveDateTime>,
    #[arg(long)]
    all_day: bool,
    #[arg(long)]
    description: Option<String>,
    /// Link the event to a note
    #[arg(long)]
    note: Option<String>,
    #[arg(long)]
    color: Option<String>,
}

impl EventFields {
    fn into_draft(self) -> EventDraft {
        EventDraft {
            title: self.title,
            start: self.start,
            end: self.end.unwrap_or(self.start),
            all_day: self.all_day,
            description: self.description,
            note_id: self.note,
            color: self.color,
        }
    }
}

#[derive(Subcommand)]
pub enum EventAction {
    /// List events sorted by start
    List {
        /// Only events occurring on this date (YYYY-MM-DD)
        #[arg(long)]
        on: Option<NaiveDate>,
    },
    /// Events that have not ended and start before the day after tomorrow
    Upcoming,
    /// Show one event
    Show { id: String },
    /// Add an event
    Add(EventFields),
    /// Replace an event's fields
    Edit {
        id: String,
        #[command(flatten)]
        fields: EventFields,
    },
    /// Delete an event (its note loses the link)
    Delete { id: String },
    /// Remove an event's note link on both sides
    Unlink { id: String },
}

pub fn run(action: EventAction, config: &Config) -> CmdResult {
    let store = open_store(config)?;
    let tz = user_timezone(&store);
    let mut planner = Planner::new(&store);

    match action {
        EventAction::List { on } => {
            let events = match on {
                Some(date) => planner.events_on(date, &tz),
                None => planner.events(),
            };
            print_json(&events)?;
        }
        EventAction::Upcoming => {
            let now = Utc::now().with_timezone(&tz);
            print_json(&planner.upcoming_events(&now))?;
        }
        EventAction::Show { id } => match planner.event(&id) {
            Some(event) => print_json(&event)?,
            None => return Err(format!("event not found: {id}").into()),
        },
        EventAction::Add(fields) => {
            let event = planner.save_event(fields.into_draft(), &tz, None)?;
            print_json(&event)?;
        }
        EventAction::Edit { id, fields } => {
            let event = planner.save_event(fields.into_draft(), &tz, Some(&id))?;
            print_json(&event)?;
        }
        EventAction::Delete { id } => {
            planner.delete_event(&id)?;
            println!("event deleted");
        }
        EventAction::Unlink { id } => {
            planner.unlink_event(&id)?;
            print_json(&planner.event(&id))?;
        }
    }
    Ok(())
}
