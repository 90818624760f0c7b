//! Cross-context change propagation.
//!
//! Contexts that share a storage backend publish `StorageEvent`s on a shared
//! `ChangeBus`. Subscribers filter by key and re-read through the store's own
//! read path; the event payload is only a hint. `PollingRelay` carries writes
//! made by other processes on the same database file onto the local bus.

pub mod bus;
pub mod relay;

pub use bus::{Change, ChangeBus, ChangeSubscription, StorageEvent};
pub use relay::PollingRelay;
