//! # Daydeck Core Library
//!
//! This library provides the core logic of the Daydeck personal dashboard:
//! alarms, countdown timers, world clocks, notes and calendar events, and an
//! AI meeting-time assistant. The `daydeck` CLI is a thin front end over the
//! same library.
//!
//! ## Architecture
//!
//! - **Storage**: a typed key/value store over an in-memory or SQLite
//!   backend. Every successful write is announced on a change bus so other
//!   store contexts re-read the value.
//! - **Sync**: the change bus itself, plus a polling relay that carries
//!   writes made by other processes sharing the same database file.
//! - **Timer**: a countdown state machine driven by per-timer tickers.
//! - **Planner**: notes and events with a bidirectional link kept consistent
//!   by each mutating operation.
//!
//! ## Key Components
//!
//! - [`LocalStore`] and [`Binding`]: persisted, synchronized collections
//! - [`active_alarms`]: which alarms apply today
//! - [`TimerBoard`]: running countdowns
//! - [`read_clock`] and [`ClockWall`]: world clock rendering
//! - [`Planner`]: notes and calendar events
//! - [`MeetingAssistant`]: AI meeting suggestions

pub mod alarms;
pub mod assistant;
pub mod clock;
pub mod error;
pub mod events;
pub mod models;
pub mod planner;
pub mod storage;
pub mod sync;
pub mod timer;

pub use alarms::{active_alarms, AlarmBook};
pub use assistant::{GeminiAssistant, MeetingAssistant, MeetingRequest, MeetingSuggestion};
pub use clock::{read_clock, ClockReading, ClockWall};
pub use error::{AssistantError, ConfigError, CoreError, StoreError, ValidationError};
pub use events::Event;
pub use planner::Planner;
pub use storage::{Binding, Config, LocalStore, MemoryBackend, SqliteBackend, StorageBackend};
pub use sync::{ChangeBus, PollingRelay, StorageEvent};
pub use timer::{CountdownState, TickerArena, TimerBoard};
