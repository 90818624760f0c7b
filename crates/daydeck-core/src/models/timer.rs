use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Persisted countdown timer. State transitions live in `crate::timer::engine`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timer {
    pub id: String,
    /// Total length in seconds, always > 0.
    pub duration: u64,
    /// Seconds left, `0..=duration`.
    pub remaining: u64,
    pub is_running: bool,
    #[serde(default)]
    pub label: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

impl Timer {
    /// Builds a new idle timer. `position` is the collection length used for
    /// the fallback label (`Timer 3`).
    pub fn from_draft(
        draft: TimerDraft,
        position: usize,
        now: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        let duration = draft.total_secs().ok_or_else(|| {
            ValidationError::invalid("duration", "Timer duration is too long.")
        })?;
        if duration == 0 {
            return Err(ValidationError::NonPositiveDuration);
        }
        let label = match draft.label.trim() {
            "" => format!("Timer {}", position + 1),
            other => other.to_string(),
        };
        Ok(Self {
            id: super::new_id(),
            duration,
            remaining: duration,
            is_running: false,
            label,
            created_at: super::to_millis(now),
        })
    }

    /// 0.0 .. 100.0 elapsed percentage.
    pub fn progress_pct(&self) -> f64 {
        if self.duration == 0 {
            return 0.0;
        }
        let elapsed = self.duration.saturating_sub(self.remaining);
        elapsed as f64 / self.duration as f64 * 100.0
    }
}

/// Submitted timer form (hours/minutes/seconds fields).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimerDraft {
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
    pub label: String,
}

impl TimerDraft {
    pub fn from_secs(seconds: u64) -> Self {
        Self {
            seconds,
            ..Self::default()
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// `None` when the fields add up past `u64::MAX` seconds.
    pub fn total_secs(&self) -> Option<u64> {
        self.hours
            .checked_mul(3600)?
            .checked_add(self.minutes.checked_mul(60)?)?
            .checked_add(self.seconds)
    }
}

/// `HH:MM:SS` rendering used by listings.
pub fn format_hms(total_secs: u64) -> String {
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_duration_is_rejected() {
        let err = Timer::from_draft(TimerDraft::default(), 0, Utc::now()).unwrap_err();
        assert_eq!(err, ValidationError::NonPositiveDuration);
    }

    #[test]
    fn new_timer_starts_full_and_idle() {
        let draft = TimerDraft {
            hours: 1,
            minutes: 2,
            seconds: 3,
            label: String::new(),
        };
        let timer = Timer::from_draft(draft, 2, Utc::now()).unwrap();
        assert_eq!(timer.duration, 3723);
        assert_eq!(timer.remaining, 3723);
        assert!(!timer.is_running);
        assert_eq!(timer.label, "Timer 3");
    }

    #[test]
    fn oversized_duration_is_rejected() {
        let draft = TimerDraft {
            hours: u64::MAX / 3600 + 1,
            ..TimerDraft::default()
        };
        assert_eq!(draft.total_secs(), None);
        let err = Timer::from_draft(draft, 0, Utc::now()).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidValue { .. }));

        let draft = TimerDraft {
            minutes: 1,
            seconds: u64::MAX - 30,
            ..TimerDraft::default()
        };
        assert!(Timer::from_draft(draft, 0, Utc::now()).is_err());
    }

    #[test]
    fn format_hms_pads() {
        assert_eq!(format_hms(0), "00:00:00");
        assert_eq!(format_hms(3723), "01:02:03");
    }

    #[test]
    fn progress_counts_elapsed() {
        let mut timer = Timer::from_draft(TimerDraft::from_secs(4), 0, Utc::now()).unwrap();
        timer.remaining = 1;
        assert_eq!(timer.progress_pct(), 75.0);
    }
}
