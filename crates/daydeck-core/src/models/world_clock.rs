use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A labelled view onto an IANA time zone. Resolution happens at render
/// time, so an unknown identifier is stored as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldClock {
    pub id: String,
    pub timezone: String,
    pub label: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorldClockDraft {
    pub label: String,
    pub timezone: String,
}

/// Resolve an IANA zone name. An exact match wins; otherwise letter case is
/// ignored, so `america/new_york` names the same zone as `America/New_York`.
pub fn parse_zone(name: &str) -> Option<Tz> {
    let name = name.trim();
    name.parse::<Tz>()
        .ok()
        .or_else(|| Tz::from_str_insensitive(name).ok())
}

impl WorldClock {
    pub fn from_draft(draft: WorldClockDraft) -> Result<Self, ValidationError> {
        let label = draft.label.trim();
        let timezone = draft.timezone.trim();
        if label.is_empty() || timezone.is_empty() {
            return Err(ValidationError::Required(
                "Please provide both a label and a timezone.",
            ));
        }
        Ok(Self {
            id: super::new_id(),
            timezone: timezone.to_string(),
            label: label.to_string(),
        })
    }
}
