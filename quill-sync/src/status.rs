//! Sync status state machine.
//!
//! ```text
//!            mutate            timer fires          save ok (latest sent)
//!   IDLE ──────────▶ UNSAVED ─────────────▶ SAVING ─────────────────────▶ SAVED
//!                      ▲  ▲                   │ │ save ok (newer unsent)
//!                      │  └───────────────────┘ │
//!                      │          save failed   ▼
//!                      └──────── mutate ─────  ERROR
//! ```
//!
//! A mutation while `SAVING` leaves the status at `SAVING`; the outcome of
//! that in-flight save then decides between `SAVED` and `UNSAVED`.

use quill_types::SyncStatus;

/// Inputs to the status machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncEvent {
    /// Local content changed.
    Mutated,
    /// A save request was issued.
    SaveStarted,
    /// A save request resolved. `covers_latest` is false when newer
    /// content arrived after the request was issued.
    SaveSucceeded { covers_latest: bool },
    /// A save request was rejected.
    SaveFailed,
    /// Document switch or engine reset.
    Reset,
}

/// Pure transition function.
pub fn next(current: SyncStatus, event: SyncEvent) -> SyncStatus {
    match event {
        SyncEvent::Mutated if current == SyncStatus::Saving => SyncStatus::Saving,
        SyncEvent::Mutated => SyncStatus::Unsaved,
        SyncEvent::SaveStarted => SyncStatus::Saving,
        SyncEvent::SaveSucceeded { covers_latest: true } => SyncStatus::Saved,
        SyncEvent::SaveSucceeded { covers_latest: false } => SyncStatus::Unsaved,
        SyncEvent::SaveFailed => SyncStatus::Error,
        SyncEvent::Reset => SyncStatus::Idle,
    }
}

#[derive(Debug, Clone, Default)]
pub struct StatusMachine {
    current: SyncStatus,
}

impl StatusMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> SyncStatus {
        self.current
    }

    pub fn apply(&mut self, event: SyncEvent) -> SyncStatus {
        self.current = next(self.current, event);
        self.current
    }
}
