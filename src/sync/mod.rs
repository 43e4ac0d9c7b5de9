//! Keeps the text view and the structural view of a script consistent.

pub mod clock;
pub mod engine;
pub mod worker;

pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::{Authority, Engine, EngineOptions, SyncError, SyncEvent, SyncState};
pub use worker::{SyncCommand, SyncSnapshot, SyncWorker};
