use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::CountdownState;

/// Every timer state change produces an Event.
/// The CLI prints them; `TimerBoard` subscribers receive them as they happen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerStarted {
        timer_id: String,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerPaused {
        timer_id: String,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerTicked {
        timer_id: String,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    /// Countdown reached zero; the timer stopped itself.
    TimerExpired {
        timer_id: String,
        label: String,
        at: DateTime<Utc>,
    },
    TimerReset {
        timer_id: String,
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    TimerDeleted {
        timer_id: String,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        timer_id: String,
        state: CountdownState,
        remaining_secs: u64,
        duration_secs: u64,
        progress_pct: f64,
        at: DateTime<Utc>,
    },
}

impl Event {
    pub fn timer_id(&self) -> &str {
        match self {
            Event::TimerStarted { timer_id, .. }
            | Event::TimerPaused { timer_id, .. }
            | Event::TimerTicked { timer_id, .. }
            | Event::TimerExpired { timer_id, .. }
            | Event::TimerReset { timer_id, .. }
            | Event::TimerDeleted { timer_id, .. }
            | Event::StateSnapshot { timer_id, .. } => timer_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_type_tag() {
        let event = Event::TimerExpired {
            timer_id: "t-1".into(),
            label: "Tea".into(),
            at: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "TimerExpired");
        assert_eq!(json["timer_id"], "t-1");
        assert_eq!(event.timer_id(), "t-1");
    }
}
