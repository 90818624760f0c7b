use chrono::Utc;
use clap::Args;
use daydeck_core::storage::SettingsKey;
use daydeck_core::{Config, GeminiAssistant, MeetingAssistant, MeetingRequest, Planner};
use serde_json::json;

use super::{open_store, print_json, user_timezone, CmdResult};

#[derive(Args)]
pub struct SuggestArgs {
    /// Free-form meeting notes
    #[arg(conflicts_with = "note")]
    text: Option<String>,
    /// Analyze a stored note instead
    #[arg(long)]
    note: Option<String>,
    /// Save the suggested slot as a one-hour event with this title
    #[arg(long, value_name = "TITLE")]
    create_event: Option<String>,
}

pub async fn run(args: SuggestArgs, config: &Config) -> CmdResult {
    let store = open_store(config)?;
    let tz = user_timezone(&store);
    let mut planner = Planner::new(&store);

    let notes = match (&args.text, &args.note) {
        (_, Some(id)) => match planner.note(id) {
            Some(note) => format!("{}\n{}", note.title, note.content),
            None => return Err(format!("note not found: {id}").into()),
        },
        (Some(text), None) => text.clone(),
        (None, None) => String::new(),
    };
    let mut request = MeetingRequest::new(notes);
    request.today = Utc::now().with_timezone(&tz).date_naive();

    let api_key = store.read::<SettingsKey>().gemini_api_key;
    let assistant = GeminiAssistant::from_config(config, api_key)?;
    let suggestion = assistant.suggest(&request).await?;

    let Some(title) = args.create_event else {
        print_json(&suggestion)?;
        return Ok(());
    };
    let mut draft = suggestion.to_event_draft(title)?;
    if let Some(id) = args.note {
        draft = draft.with_note(id);
    }
    let event = planner.save_event(draft, &tz, None)?;
    print_json(&json!({ "suggestion": suggestion, "event": event }))?;
    Ok(())
}
