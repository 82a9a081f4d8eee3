//! Debounced save scheduling.
//!
//! [`SaveScheduler`] is the pure bookkeeping half of the autosave loop. It
//! never sleeps or performs I/O; the engine owns the timer and the network
//! call and reports back through [`SaveScheduler::timer_fired`] and
//! [`SaveScheduler::save_finished`].
//!
//! Every change bumps a revision and hands out a fresh [`TimerToken`]. Only
//! the most recently issued token can fire, which makes the debounce
//! trailing-edge only. At most one [`SaveTicket`] is outstanding at a time;
//! a timer that fires while a save is in flight is deferred and turned into
//! a follow-up once that save completes.

/// Monotonic revision of local content. Zero means "nothing recorded".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Revision(pub u64);

/// Identifies one armed debounce timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerToken(u64);

/// A save request: the content captured at issue time and its revision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveTicket {
    pub revision: Revision,
    pub content: String,
}

/// Result of a timer expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerFire {
    /// The token was superseded or cancelled.
    Stale,
    /// A save is already in flight; a follow-up will be issued on completion.
    Deferred,
    /// Issue this save now.
    Issue(SaveTicket),
}

/// Result of a completed save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveOutcome {
    /// True when the saved revision is the latest local revision.
    pub covers_latest: bool,
    /// Save to issue immediately because the timer fired meanwhile.
    pub follow_up: Option<SaveTicket>,
}

#[derive(Debug, Default)]
pub struct SaveScheduler {
    latest: Option<String>,
    revision: Revision,
    persisted: Revision,
    timer_seq: u64,
    armed: Option<TimerToken>,
    in_flight: Option<Revision>,
    follow_up: bool,
}

impl SaveScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record new content and arm a fresh timer, superseding any armed one.
    pub fn changed(&mut self, content: String) -> TimerToken {
        self.latest = Some(content);
        self.revision = Revision(self.revision.0 + 1);
        self.timer_seq += 1;
        let token = TimerToken(self.timer_seq);
        self.armed = Some(token);
        token
    }

    pub fn timer_fired(&mut self, token: TimerToken) -> TimerFire {
        if self.armed != Some(token) {
            return TimerFire::Stale;
        }
        self.armed = None;

        if self.in_flight.is_some() {
            self.follow_up = true;
            return TimerFire::Deferred;
        }

        match self.issue() {
            Some(ticket) => TimerFire::Issue(ticket),
            None => TimerFire::Stale,
        }
    }

    /// Report the completion of the in-flight save.
    pub fn save_finished(&mut self, ticket: &SaveTicket, succeeded: bool) -> SaveOutcome {
        if self.in_flight == Some(ticket.revision) {
            self.in_flight = None;
        }
        if succeeded && ticket.revision > self.persisted {
            self.persisted = ticket.revision;
        }

        let covers_latest = succeeded
            && ticket.revision == self.revision
            && self.persisted == self.revision
            && self.armed.is_none();
        let follow_up = if std::mem::take(&mut self.follow_up) {
            self.issue()
        } else {
            None
        };

        SaveOutcome {
            covers_latest,
            follow_up,
        }
    }

    /// Drop the armed timer and any deferred follow-up.
    pub fn cancel(&mut self) {
        self.armed = None;
        self.follow_up = false;
    }

    /// Take the save slot for an explicit flush of the latest content.
    ///
    /// Returns `None` while a save is in flight. The flush covers whatever the
    /// armed timer would have sent, so the timer is disarmed. `fallback` is
    /// sent when nothing was recorded yet.
    pub fn flush(&mut self, fallback: &str) -> Option<SaveTicket> {
        if self.in_flight.is_some() {
            return None;
        }
        self.armed = None;
        self.follow_up = false;
        self.in_flight = Some(self.revision);
        Some(SaveTicket {
            revision: self.revision,
            content: self
                .latest
                .clone()
                .unwrap_or_else(|| fallback.to_string()),
        })
    }

    /// Disarm the pending timer without touching the in-flight save.
    /// Returns true when a timer was armed.
    pub fn hold(&mut self) -> bool {
        self.armed.take().is_some()
    }

    /// Arm a fresh timer for content that is still unsent.
    pub fn rearm(&mut self) -> Option<TimerToken> {
        if !self.has_unsent_changes() {
            return None;
        }
        self.timer_seq += 1;
        let token = TimerToken(self.timer_seq);
        self.armed = Some(token);
        Some(token)
    }

    pub fn latest(&self) -> Option<&str> {
        self.latest.as_deref()
    }

    pub fn revision(&self) -> Revision {
        self.revision
    }

    pub fn persisted(&self) -> Revision {
        self.persisted
    }

    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    pub fn in_flight(&self) -> Option<Revision> {
        self.in_flight
    }

    pub fn has_unsent_changes(&self) -> bool {
        self.revision > self.persisted && self.in_flight != Some(self.revision)
    }

    fn issue(&mut self) -> Option<SaveTicket> {
        let content = self.latest.clone()?;
        self.in_flight = Some(self.revision);
        Some(SaveTicket {
            revision: self.revision,
            content,
        })
    }
}
