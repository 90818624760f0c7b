use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
    /// Weak reference to a `CalendarEvent`; kept in sync by `crate::planner`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calendar_event_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl Note {
    pub fn display_title(&self) -> &str {
        if self.title.is_empty() {
            "Untitled"
        } else {
            &self.title
        }
    }

    pub fn matches(&self, needle_lower: &str) -> bool {
        self.title.to_lowercase().contains(needle_lower)
            || self.content.to_lowercase().contains(needle_lower)
    }
}

/// Submitted note form. `calendar_event_id` is the requested link target.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteDraft {
    pub title: String,
    pub content: String,
    pub calendar_event_id: Option<String>,
    pub color: Option<String>,
}

impl NoteDraft {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            ..Self::default()
        }
    }

    pub fn linked_to(mut self, event_id: impl Into<String>) -> Self {
        self.calendar_event_id = Some(event_id.into());
        self
    }

    pub(crate) fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() && self.content.trim().is_empty() {
            return Err(ValidationError::Required(
                "Note must have a title or content.",
            ));
        }
        Ok(())
    }

    /// Builds a note without its link; the planner sets `calendar_event_id`
    /// together with the event's back-reference.
    pub(crate) fn into_note(self, now: DateTime<Utc>) -> Result<Note, ValidationError> {
        self.validate()?;
        let now = super::to_millis(now);
        Ok(Note {
            id: super::new_id(),
            title: self.title.trim().to_string(),
            content: self.content,
            created_at: now,
            updated_at: now,
            calendar_event_id: None,
            color: super::non_blank(self.color),
        })
    }
}
