//! Notes, calendar events and the link between them.
//!
//! A note and an event may point at each other (`Note::calendar_event_id`,
//! `CalendarEvent::note_id`). Every operation here that touches one side of
//! a link rewrites the other side in the same call, so after it returns the
//! two collections agree: a note links to an event iff that event links back.

use std::cmp::Reverse;

use chrono::{DateTime, Days, NaiveDate, TimeZone, Utc};
use tracing::info;

use crate::error::{CoreError, Result, ValidationError};
use crate::models::{non_blank, now_ms, CalendarEvent, EventDraft, Note, NoteDraft};
use crate::storage::{Binding, CalendarEventsKey, LocalStore, NotesKey};

pub const RECENT_NOTES: usize = 3;
pub const UPCOMING_EVENTS: usize = 5;

pub struct Planner {
    notes: Binding<NotesKey>,
    events: Binding<CalendarEventsKey>,
}

impl Planner {
    pub fn new(store: &LocalStore) -> Self {
        Self {
            notes: Binding::new(store),
            events: Binding::new(store),
        }
    }

    fn refresh(&mut self) {
        self.notes.poll_changes();
        self.events.poll_changes();
    }

    pub fn notes(&mut self) -> Vec<Note> {
        self.refresh();
        self.notes.snapshot()
    }

    /// Events ordered by start.
    pub fn events(&mut self) -> Vec<CalendarEvent> {
        self.refresh();
        self.events.snapshot()
    }

    pub fn note(&mut self, id: &str) -> Option<Note> {
        self.refresh();
        self.notes.get().iter().find(|n| n.id == id).cloned()
    }

    pub fn event(&mut self, id: &str) -> Option<CalendarEvent> {
        self.refresh();
        self.events.get().iter().find(|e| e.id == id).cloned()
    }

    // ── Notes ────────────────────────────────────────────────────────

    /// Create a note, or edit `editing` in place. The draft's
    /// `calendar_event_id` becomes the note's link; `None` removes an
    /// existing one.
    pub fn save_note(&mut self, draft: NoteDraft, editing: Option<&str>) -> Result<Note> {
        self.refresh();
        draft.validate()?;
        let target = draft.calendar_event_id.clone().filter(|id| !id.is_empty());
        if let Some(event_id) = &target {
            self.require_event(event_id)?;
        }

        let note_id = match editing {
            Some(id) => {
                let index = self.note_index(id)?;
                let now = now_ms();
                self.notes.update(|list| {
                    let note = &mut list[index];
                    note.title = draft.title.trim().to_string();
                    note.content = draft.content.clone();
                    note.color = non_blank(draft.color.clone());
                    note.updated_at = now;
                });
                id.to_string()
            }
            None => {
                let note = draft.into_note(Utc::now())?;
                let id = note.id.clone();
                self.notes.update(|list| list.push(note));
                info!(id = %id, "note created");
                id
            }
        };

        match target {
            Some(event_id) => self.link(&note_id, &event_id)?,
            None => self.unlink_note(&note_id)?,
        }
        self.note(&note_id)
            .ok_or_else(|| CoreError::not_found("note", note_id))
    }

    pub fn delete_note(&mut self, id: &str) -> Result<()> {
        self.refresh();
        self.note_index(id)?;
        self.notes.update(|list| list.retain(|n| n.id != id));
        self.clear_event_refs(id);
        info!(id, "note deleted");
        Ok(())
    }

    /// Notes whose title or content contains `query` (case-insensitive),
    /// most recently updated first. A blank query matches every note.
    pub fn search_notes(&mut self, query: &str) -> Vec<Note> {
        self.refresh();
        let needle = query.trim().to_lowercase();
        let mut found: Vec<Note> = self
            .notes
            .get()
            .iter()
            .filter(|n| needle.is_empty() || n.matches(&needle))
            .cloned()
            .collect();
        found.sort_by_key(|n| Reverse(n.updated_at));
        found
    }

    pub fn recent_notes(&mut self, limit: usize) -> Vec<Note> {
        let mut notes = self.search_notes("");
        notes.truncate(limit);
        notes
    }

    // ── Events ───────────────────────────────────────────────────────

    /// Create an event, or edit `editing` in place. Wall-clock times in the
    /// draft are resolved in `tz`. The draft's `note_id` becomes the link;
    /// `None` removes an existing one.
    pub fn save_event<Tz: TimeZone>(
        &mut self,
        draft: EventDraft,
        tz: &Tz,
        editing: Option<&str>,
    ) -> Result<CalendarEvent> {
        self.refresh();
        let target = draft.note_id.clone().filter(|id| !id.is_empty());
        if let Some(note_id) = &target {
            self.require_note(note_id)?;
        }

        let event_id = match editing {
            Some(id) => {
                let index = self.event_index(id)?;
                let mut edited = self.events.get()[index].clone();
                edited.apply(&draft, tz)?;
                self.events.update(|list| {
                    list[index] = edited;
                    sort_by_start(list);
                });
                id.to_string()
            }
            None => {
                let mut event = CalendarEvent::from_draft(&draft, tz, Utc::now())?;
                event.note_id = None;
                let id = event.id.clone();
                self.events.update(|list| {
                    list.push(event);
                    sort_by_start(list);
                });
                info!(id = %id, "event created");
                id
            }
        };

        match target {
            Some(note_id) => self.link(&note_id, &event_id)?,
            None => self.unlink_event(&event_id)?,
        }
        self.event(&event_id)
            .ok_or_else(|| CoreError::not_found("event", event_id))
    }

    pub fn delete_event(&mut self, id: &str) -> Result<()> {
        self.refresh();
        self.event_index(id)?;
        self.events.update(|list| list.retain(|e| e.id != id));
        self.clear_note_refs(id);
        info!(id, "event deleted");
        Ok(())
    }

    /// Events starting on `date` in `tz`, plus all-day events that started
    /// earlier and end after it. Ordered by start.
    pub fn events_on<Tz: TimeZone>(&mut self, date: NaiveDate, tz: &Tz) -> Vec<CalendarEvent> {
        self.refresh();
        let mut found: Vec<CalendarEvent> = self
            .events
            .get()
            .iter()
            .filter(|e| {
                let start_day = e.start.with_timezone(tz).date_naive();
                let end_day = e.end.with_timezone(tz).date_naive();
                start_day == date || (e.all_day && start_day < date && date < end_day)
            })
            .cloned()
            .collect();
        sort_by_start(&mut found);
        found
    }

    /// Events not yet over whose start falls before the end of tomorrow,
    /// first few by start.
    pub fn upcoming_events<Tz: TimeZone>(&mut self, now: &DateTime<Tz>) -> Vec<CalendarEvent> {
        self.refresh();
        let now_utc = now.with_timezone(&Utc);
        let horizon = now
            .date_naive()
            .checked_add_days(Days::new(2))
            .and_then(|day| day.and_hms_opt(0, 0, 0))
            .and_then(|midnight| now.timezone().from_local_datetime(&midnight).earliest())
            .map(|dt| dt.with_timezone(&Utc));
        let mut found: Vec<CalendarEvent> = self
            .events
            .get()
            .iter()
            .filter(|e| e.end >= now_utc && horizon.map_or(true, |h| e.start < h))
            .cloned()
            .collect();
        sort_by_start(&mut found);
        found.truncate(UPCOMING_EVENTS);
        found
    }

    // ── Links ────────────────────────────────────────────────────────

    /// Link `note_id` and `event_id`, detaching each from any previous
    /// partner. Both ids must exist; nothing changes otherwise.
    pub fn link(&mut self, note_id: &str, event_id: &str) -> Result<()> {
        self.refresh();
        self.require_note(note_id)?;
        self.require_event(event_id)?;

        self.notes.update(|notes| {
            for note in notes.iter_mut() {
                if note.id == note_id {
                    note.calendar_event_id = Some(event_id.to_string());
                } else if note.calendar_event_id.as_deref() == Some(event_id) {
                    note.calendar_event_id = None;
                }
            }
        });
        self.events.update(|events| {
            for event in events.iter_mut() {
                if event.id == event_id {
                    event.note_id = Some(note_id.to_string());
                } else if event.note_id.as_deref() == Some(note_id) {
                    event.note_id = None;
                }
            }
        });
        info!(note = note_id, event = event_id, "linked");
        Ok(())
    }

    /// Detach a note from its event, if any.
    pub fn unlink_note(&mut self, note_id: &str) -> Result<()> {
        self.refresh();
        let index = self.note_index(note_id)?;
        if self.notes.get()[index].calendar_event_id.is_none() {
            return Ok(());
        }
        self.notes
            .update(|list| list[index].calendar_event_id = None);
        self.clear_event_refs(note_id);
        Ok(())
    }

    /// Detach an event from its note, if any.
    pub fn unlink_event(&mut self, event_id: &str) -> Result<()> {
        self.refresh();
        let index = self.event_index(event_id)?;
        if self.events.get()[index].note_id.is_none() {
            return Ok(());
        }
        self.events.update(|list| list[index].note_id = None);
        self.clear_note_refs(event_id);
        Ok(())
    }

    fn clear_event_refs(&mut self, note_id: &str) {
        if self
            .events
            .get()
            .iter()
            .any(|e| e.note_id.as_deref() == Some(note_id))
        {
            self.events.update(|list| {
                list.iter_mut()
                    .filter(|e| e.note_id.as_deref() == Some(note_id))
                    .for_each(|e| e.note_id = None)
            });
        }
    }

    fn clear_note_refs(&mut self, event_id: &str) {
        if self
            .notes
            .get()
            .iter()
            .any(|n| n.calendar_event_id.as_deref() == Some(event_id))
        {
            self.notes.update(|list| {
                list.iter_mut()
                    .filter(|n| n.calendar_event_id.as_deref() == Some(event_id))
                    .for_each(|n| n.calendar_event_id = None)
            });
        }
    }

    fn note_index(&self, id: &str) -> Result<usize> {
        self.notes
            .get()
            .iter()
            .position(|n| n.id == id)
            .ok_or_else(|| CoreError::not_found("note", id))
    }

    fn event_index(&self, id: &str) -> Result<usize> {
        self.events
            .get()
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| CoreError::not_found("event", id))
    }

    fn require_note(&self, id: &str) -> Result<(), ValidationError> {
        if self.notes.get().iter().any(|n| n.id == id) {
            Ok(())
        } else {
            Err(ValidationError::MissingLinkTarget {
                kind: "note",
                id: id.to_string(),
            })
        }
    }

    fn require_event(&self, id: &str) -> Result<(), ValidationError> {
        if self.events.get().iter().any(|e| e.id == id) {
            Ok(())
        } else {
            Err(ValidationError::MissingLinkTarget {
                kind: "event",
                id: id.to_string(),
            })
        }
    }
}

fn sort_by_start(events: &mut [CalendarEvent]) {
    events.sort_by_key(|e| e.start);
}
