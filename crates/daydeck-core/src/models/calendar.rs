//! Calendar events and the start/end normalization applied on submission.

use chrono::{DateTime, Duration, NaiveDateTime, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Shortest span a timed event may have.
pub const MIN_EVENT_MINUTES: i64 = 30;
/// Span used when the submitted end lies before the start.
pub const DEFAULT_EVENT_MINUTES: i64 = 60;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    pub id: String,
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default)]
    pub all_day: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Weak reference to a `Note`; kept in sync by `crate::planner`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

/// Submitted event form. Times are wall-clock values in the caller's zone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventDraft {
    pub title: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub all_day: bool,
    pub description: Option<String>,
    pub note_id: Option<String>,
    pub color: Option<String>,
}

impl EventDraft {
    pub fn new(title: impl Into<String>, start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self {
            title: title.into(),
            start,
            end,
            all_day: false,
            description: None,
            note_id: None,
            color: None,
        }
    }

    pub fn all_day(mut self, all_day: bool) -> Self {
        self.all_day = all_day;
        self
    }

    pub fn with_note(mut self, note_id: impl Into<String>) -> Self {
        self.note_id = Some(note_id.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Validates the title and normalizes the range, then resolves both ends
    /// in `tz`.
    pub fn resolve<Tz: TimeZone>(
        &self,
        tz: &Tz,
    ) -> Result<(String, DateTime<Utc>, DateTime<Utc>), ValidationError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(ValidationError::Required("Event title is required."));
        }
        let (start, end) = normalize_range(self.start, self.end, self.all_day);
        Ok((
            title.to_string(),
            localize(tz, start, "start")?,
            localize(tz, end, "end")?,
        ))
    }
}

/// Enforces `end > start` for timed events and day boundaries for all-day
/// events.
///
/// - timed, `end == start`: end becomes start + 30 minutes
/// - timed, `end < start`: end becomes start + 60 minutes
/// - all-day: both ends truncate to midnight; an earlier end collapses onto
///   the start day
pub fn normalize_range(
    start: NaiveDateTime,
    end: NaiveDateTime,
    all_day: bool,
) -> (NaiveDateTime, NaiveDateTime) {
    if all_day {
        let start = start.date().and_time(NaiveTime::MIN);
        let end = end.date().and_time(NaiveTime::MIN);
        return (start, end.max(start));
    }
    if end == start {
        (start, start + Duration::minutes(MIN_EVENT_MINUTES))
    } else if end < start {
        (start, start + Duration::minutes(DEFAULT_EVENT_MINUTES))
    } else {
        (start, end)
    }
}

/// Resolves a wall-clock time in `tz`. Ambiguous times (DST fold) take the
/// earlier instant; times inside a DST gap are rejected.
pub fn localize<Tz: TimeZone>(
    tz: &Tz,
    at: NaiveDateTime,
    field: &str,
) -> Result<DateTime<Utc>, ValidationError> {
    tz.from_local_datetime(&at)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| ValidationError::invalid(field, format!("{at} does not exist in this time zone")))
}

impl CalendarEvent {
    pub fn from_draft<Tz: TimeZone>(
        draft: &EventDraft,
        tz: &Tz,
        now: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        let (title, start, end) = draft.resolve(tz)?;
        Ok(Self {
            id: super::new_id(),
            title,
            start,
            end,
            all_day: draft.all_day,
            description: super::non_blank(draft.description.clone()),
            note_id: super::non_blank(draft.note_id.clone()),
            color: super::non_blank(draft.color.clone()),
            created_at: super::to_millis(now),
        })
    }

    /// Applies an edit, keeping `id`, `created_at` and the note link (links
    /// change only through the planner).
    pub fn apply<Tz: TimeZone>(&mut self, draft: &EventDraft, tz: &Tz) -> Result<(), ValidationError> {
        let (title, start, end) = draft.resolve(tz)?;
        self.title = title;
        self.start = start;
        self.end = end;
        self.all_day = draft.all_day;
        self.description = super::non_blank(draft.description.clone());
        self.color = super::non_blank(draft.color.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 10)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn equal_range_gets_minimum_span() {
        let (start, end) = normalize_range(at(9, 0), at(9, 0), false);
        assert_eq!(end - start, Duration::minutes(30));
    }

    #[test]
    fn inverted_range_is_pushed_one_hour() {
        let (start, end) = normalize_range(at(9, 0), at(8, 0), false);
        assert_eq!(start, at(9, 0));
        assert_eq!(end, at(10, 0));
    }

    #[test]
    fn valid_range_is_untouched() {
        assert_eq!(normalize_range(at(9, 0), at(9, 5), false), (at(9, 0), at(9, 5)));
    }

    #[test]
    fn all_day_truncates_to_midnight() {
        let (start, end) = normalize_range(at(9, 30), at(7, 0), true);
        assert_eq!(start, at(0, 0));
        assert_eq!(end, at(0, 0));
    }

    #[test]
    fn blank_title_is_rejected() {
        let draft = EventDraft::new("  ", at(9, 0), at(10, 0));
        let err = CalendarEvent::from_draft(&draft, &Utc, Utc::now()).unwrap_err();
        assert_eq!(err.to_string(), "Event title is required.");
    }

    #[test]
    fn draft_resolves_in_zone() {
        let tz: chrono_tz::Tz = "Europe/Berlin".parse().unwrap();
        let draft = EventDraft::new("Standup", at(9, 0), at(9, 0));
        let event = CalendarEvent::from_draft(&draft, &tz, Utc::now()).unwrap();
        assert_eq!(event.start.to_rfc3339(), "2024-05-10T07:00:00+00:00");
        assert_eq!(event.end - event.start, Duration::minutes(30));
    }

    #[test]
    fn instants_serialize_as_rfc3339_strings() {
        let draft = EventDraft::new("Review", at(14, 0), at(15, 0));
        let event = CalendarEvent::from_draft(&draft, &Utc, Utc::now()).unwrap();
        let json = serde_json::to_value(&event).unwrap();
        assert!(json["start"].as_str().unwrap().starts_with("2024-05-10T14:00:00"));
        assert!(json.get("noteId").is_none());
    }
}
