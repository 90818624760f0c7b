//! Alarm records, weekday tags and the strict `HH:MM` time type.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, TimeZone, Timelike, Utc, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// One of the seven recognized weekday tags.
///
/// Ordered Sun..Sat so a `BTreeSet<DayTag>` lists days the way the alarm
/// form shows them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DayTag {
    Sun,
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
}

impl DayTag {
    pub const ALL: [DayTag; 7] = [
        DayTag::Sun,
        DayTag::Mon,
        DayTag::Tue,
        DayTag::Wed,
        DayTag::Thu,
        DayTag::Fri,
        DayTag::Sat,
    ];

    pub fn from_weekday(weekday: Weekday) -> Self {
        match weekday {
            Weekday::Sun => DayTag::Sun,
            Weekday::Mon => DayTag::Mon,
            Weekday::Tue => DayTag::Tue,
            Weekday::Wed => DayTag::Wed,
            Weekday::Thu => DayTag::Thu,
            Weekday::Fri => DayTag::Fri,
            Weekday::Sat => DayTag::Sat,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DayTag::Sun => "Sun",
            DayTag::Mon => "Mon",
            DayTag::Tue => "Tue",
            DayTag::Wed => "Wed",
            DayTag::Thu => "Thu",
            DayTag::Fri => "Fri",
            DayTag::Sat => "Sat",
        }
    }
}

impl fmt::Display for DayTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DayTag {
    type Err = ValidationError;

    /// Accepts the three-letter tag in any case (`mon`, `MON`, `Mon`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        DayTag::ALL
            .into_iter()
            .find(|d| d.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| ValidationError::invalid("days", format!("unknown weekday tag '{s}'")))
    }
}

/// Wall-clock time of day in strict 24-hour `HH:MM` form.
///
/// Field order makes the derived `Ord` chronological, which matches the
/// lexicographic order of the fixed-width string form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClockTime {
    hour: u8,
    minute: u8,
}

impl ClockTime {
    pub fn new(hour: u8, minute: u8) -> Result<Self, ValidationError> {
        if hour > 23 || minute > 59 {
            return Err(ValidationError::invalid(
                "time",
                format!("{hour:02}:{minute:02} is not a valid 24-hour time"),
            ));
        }
        Ok(Self { hour, minute })
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }

    /// Time of day of `at`, truncated to the minute.
    pub fn of<Tz: TimeZone>(at: &DateTime<Tz>) -> Self {
        Self {
            hour: at.hour() as u8,
            minute: at.minute() as u8,
        }
    }
}

impl FromStr for ClockTime {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        let well_formed = bytes.len() == 5
            && bytes[2] == b':'
            && [0, 1, 3, 4].iter().all(|&i| bytes[i].is_ascii_digit());
        if !well_formed {
            return Err(ValidationError::invalid(
                "time",
                format!("'{s}' does not match HH:MM"),
            ));
        }
        let hour = (bytes[0] - b'0') * 10 + (bytes[1] - b'0');
        let minute = (bytes[3] - b'0') * 10 + (bytes[4] - b'0');
        Self::new(hour, minute)
    }
}

impl TryFrom<String> for ClockTime {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ClockTime> for String {
    fn from(value: ClockTime) -> Self {
        value.to_string()
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alarm {
    pub id: String,
    pub time: ClockTime,
    #[serde(default)]
    pub label: String,
    /// Empty means "once"; otherwise the alarm recurs on these weekdays.
    #[serde(default)]
    pub days: BTreeSet<DayTag>,
    pub is_enabled: bool,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

impl Alarm {
    pub fn from_draft(draft: AlarmDraft, now: DateTime<Utc>) -> Result<Self, ValidationError> {
        let time = draft.parse_time()?;
        Ok(Self {
            id: super::new_id(),
            time,
            label: draft.label.trim().to_string(),
            days: draft.days,
            is_enabled: draft.is_enabled,
            created_at: super::to_millis(now),
        })
    }

    /// Applies an edit, keeping `id` and `created_at`.
    pub fn apply(&mut self, draft: AlarmDraft) -> Result<(), ValidationError> {
        self.time = draft.parse_time()?;
        self.label = draft.label.trim().to_string();
        self.days = draft.days;
        self.is_enabled = draft.is_enabled;
        Ok(())
    }

    pub fn is_recurring(&self) -> bool {
        !self.days.is_empty()
    }

    /// Label shown in listings: the label, or the time when blank.
    pub fn display_name(&self) -> String {
        if self.label.is_empty() {
            self.time.to_string()
        } else {
            self.label.clone()
        }
    }

    /// `Mon, Wed` for recurring alarms, `Once` otherwise.
    pub fn repeat_summary(&self) -> String {
        if self.days.is_empty() {
            "Once".to_string()
        } else {
            self.days
                .iter()
                .map(DayTag::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        }
    }
}

/// Submitted alarm form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlarmDraft {
    pub time: String,
    pub label: String,
    pub days: BTreeSet<DayTag>,
    pub is_enabled: bool,
}

impl AlarmDraft {
    pub fn new(time: impl Into<String>) -> Self {
        Self {
            time: time.into(),
            label: String::new(),
            days: BTreeSet::new(),
            is_enabled: true,
        }
    }

    /// Blank form pre-filled five minutes ahead of `now`.
    pub fn prefilled<Tz: TimeZone>(now: &DateTime<Tz>) -> Self {
        let at = now.clone() + Duration::minutes(5);
        Self::new(ClockTime::of(&at).to_string())
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_days(mut self, days: impl IntoIterator<Item = DayTag>) -> Self {
        self.days = days.into_iter().collect();
        self
    }

    pub fn enabled(mut self, is_enabled: bool) -> Self {
        self.is_enabled = is_enabled;
        self
    }

    fn parse_time(&self) -> Result<ClockTime, ValidationError> {
        let time = self.time.trim();
        if time.is_empty() {
            return Err(ValidationError::Required("Time is required for an alarm."));
        }
        time.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn clock_time_parses_strict_24h() {
        assert_eq!("07:05".parse::<ClockTime>().unwrap().to_string(), "07:05");
        assert_eq!("23:59".parse::<ClockTime>().unwrap().hour(), 23);
        for bad in ["7:05", "24:00", "12:60", "1200", "ab:cd", "12:5", " 12:00"] {
            assert!(bad.parse::<ClockTime>().is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn clock_time_order_matches_string_order() {
        let mut times: Vec<ClockTime> = ["13:00", "07:30", "07:05", "00:00"]
            .iter()
            .map(|s| s.parse().unwrap())
            .collect();
        times.sort();
        let rendered: Vec<String> = times.iter().map(|t| t.to_string()).collect();
        assert_eq!(rendered, ["00:00", "07:05", "07:30", "13:00"]);
    }

    #[test]
    fn day_tags_parse_case_insensitively() {
        assert_eq!("mon".parse::<DayTag>().unwrap(), DayTag::Mon);
        assert_eq!("SAT".parse::<DayTag>().unwrap(), DayTag::Sat);
        assert!("Monday".parse::<DayTag>().is_err());
    }

    #[test]
    fn days_deduplicate_and_sort() {
        let draft = AlarmDraft::new("06:30").with_days([DayTag::Fri, DayTag::Mon, DayTag::Fri]);
        let alarm = Alarm::from_draft(draft, Utc::now()).unwrap();
        assert_eq!(alarm.days.len(), 2);
        assert_eq!(alarm.repeat_summary(), "Mon, Fri");
    }

    #[test]
    fn empty_time_is_required() {
        let err = Alarm::from_draft(AlarmDraft::new("  "), Utc::now()).unwrap_err();
        assert_eq!(err.to_string(), "Time is required for an alarm.");
    }

    #[test]
    fn alarm_wire_shape_is_camel_case() {
        let created = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();
        let draft = AlarmDraft::new("07:00").with_label("Gym").with_days([DayTag::Tue]);
        let alarm = Alarm::from_draft(draft, created).unwrap();
        let json = serde_json::to_value(&alarm).unwrap();
        assert_eq!(json["time"], "07:00");
        assert_eq!(json["isEnabled"], true);
        assert_eq!(json["days"], serde_json::json!(["Tue"]));
        assert_eq!(json["createdAt"], 1_700_000_000_000i64);
    }

    #[test]
    fn prefilled_draft_is_five_minutes_ahead() {
        let now = Utc.with_ymd_and_hms(2024, 3, 4, 23, 57, 10).unwrap();
        assert_eq!(AlarmDraft::prefilled(&now).time, "00:02");
    }
}
