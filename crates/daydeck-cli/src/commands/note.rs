use clap::Subcommand;
use daydeck_core::models::NoteDraft;
use daydeck_core::planner::RECENT_NOTES;
use daydeck_core::{Config, Planner};

use super::{open_store, print_json, CmdResult};

#[derive(Subcommand)]
pub enum NoteAction {
    /// List notes, newest edit first
    List {
        /// Case-insensitive filter on title and content
        #[arg(long)]
        search: Option<String>,
        /// Only the most recently edited notes
        #[arg(long)]
        recent: bool,
    },
    /// Show one note
    Show { id: String },
    /// Add a note
    Add {
        #[arg(long, default_value = "")]
        title: String,
        #[arg(long, default_value = "")]
        content: String,
        /// Link the note to a calendar event
        #[arg(long)]
        event: Option<String>,
        #[arg(long)]
        color: Option<String>,
    },
    /// Replace a note's title, content and link
    Edit {
        id: String,
        #[arg(long, default_value = "")]
        title: String,
        #[arg(long, default_value = "")]
        content: String,
        #[arg(long)]
        event: Option<String>,
        #[arg(long)]
        color: Option<String>,
    },
    /// Delete a note (its event loses the link)
    Delete { id: String },
    /// Link a note and an event to each other
    Link { id: String, event: String },
    /// Remove a note's event link on both sides
    Unlink { id: String },
}

fn draft(title: String, content: String, event: Option<String>, color: Option<String>) -> NoteDraft {
    NoteDraft {
        title,
        content,
        calendar_event_id: event,
        color,
    }
}

pub fn run(action: NoteAction, config: &Config) -> CmdResult {
    let store = open_store(config)?;
    let mut planner = Planner::new(&store);

    match action {
        NoteAction::List { search, recent } => {
            let notes = match (search, recent) {
                (Some(query), _) => planner.search_notes(&query),
                (None, true) => planner.recent_notes(RECENT_NOTES),
                (None, false) => planner.search_notes(""),
            };
            print_json(&notes)?;
        }
        NoteAction::Show { id } => match planner.note(&id) {
            Some(note) => print_json(&note)?,
            None => return Err(format!("note not found: {id}").into()),
        },
        NoteAction::Add {
            title,
            content,
            event,
            color,
        } => {
            let note = planner.save_note(draft(title, content, event, color), None)?;
            print_json(&note)?;
        }
        NoteAction::Edit {
            id,
            title,
            content,
            event,
            color,
        } => {
            let note = planner.save_note(draft(title, content, event, color), Some(&id))?;
            print_json(&note)?;
        }
        NoteAction::Delete { id } => {
            planner.delete_note(&id)?;
            println!("note deleted");
        }
        NoteAction::Link { id, event } => {
            planner.link(&id, &event)?;
            print_json(&planner.note(&id))?;
        }
        NoteAction::Unlink { id } => {
            planner.unlink_note(&id)?;
            print_json(&planner.note(&id))?;
        }
    }
    Ok(())
}
