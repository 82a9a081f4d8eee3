//! Engine configuration and injectable clock.

use std::time::Duration;

use chrono::{DateTime, Utc};

/// Default quiet period before an autosave fires.
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(2000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncConfig {
    /// How long local edits must stay quiet before they are saved.
    pub quiet_period: Duration,
}

impl SyncConfig {
    pub fn with_quiet_period(quiet_period: Duration) -> Self {
        Self { quiet_period }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            quiet_period: DEFAULT_QUIET_PERIOD,
        }
    }
}

/// Source of wall-clock timestamps stamped onto directory entries.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock frozen at a fixed instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
