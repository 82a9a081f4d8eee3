//! The editing session bound to the active document.
//!
//! An [`EditSession`] couples the save scheduler with the status machine and
//! the document metadata. It is pure: the engine feeds it events and carries
//! out the timers and saves it asks for. A session lives exactly as long as
//! its document is active; switching documents drops it.

use quill_types::{DocId, DocumentStatus, SyncStatus};
use serde_json::Value;
use tracing::debug;

use crate::content;
use crate::scheduler::{SaveOutcome, SaveScheduler, SaveTicket, TimerFire, TimerToken};
use crate::status::{StatusMachine, SyncEvent};

/// Identity of one activation. A fresh value is minted every time a document
/// becomes active, even when it is the same document as before.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Generation(pub u64);

/// Snapshot of the active document, as exposed to callers.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ActiveDocument {
    pub id: DocId,
    pub title: String,
    pub status: DocumentStatus,
    pub is_owner: bool,
    /// Latest local content (sanitized initial state until the first edit).
    pub content: String,
    pub sync: SyncStatus,
}

#[derive(Debug)]
pub struct EditSession {
    id: DocId,
    generation: Generation,
    title: String,
    doc_status: DocumentStatus,
    is_owner: bool,
    initial: String,
    scheduler: SaveScheduler,
    status: StatusMachine,
}

impl EditSession {
    /// `initial` must already be sanitized.
    pub fn new(
        id: DocId,
        generation: Generation,
        title: String,
        doc_status: DocumentStatus,
        is_owner: bool,
        initial: String,
    ) -> Self {
        Self {
            id,
            generation,
            title,
            doc_status,
            is_owner,
            initial,
            scheduler: SaveScheduler::new(),
            status: StatusMachine::new(),
        }
    }

    pub fn id(&self) -> &DocId {
        &self.id
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn is_owner(&self) -> bool {
        self.is_owner
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn doc_status(&self) -> DocumentStatus {
        self.doc_status
    }

    pub fn status(&self) -> SyncStatus {
        self.status.current()
    }

    pub fn scheduler(&self) -> &SaveScheduler {
        &self.scheduler
    }

    /// Latest local content.
    pub fn content(&self) -> &str {
        self.scheduler.latest().unwrap_or(&self.initial)
    }

    pub fn set_title(&mut self, title: String) {
        self.title = title;
    }

    pub fn set_doc_status(&mut self, status: DocumentStatus) {
        self.doc_status = status;
    }

    pub fn snapshot(&self) -> ActiveDocument {
        ActiveDocument {
            id: self.id.clone(),
            title: self.title.clone(),
            status: self.doc_status,
            is_owner: self.is_owner,
            content: self.content().to_string(),
            sync: self.status(),
        }
    }

    /// Record a local mutation. Returns the token of the timer to arm, or
    /// `None` when the mutation must not lead to a save.
    pub fn notify_changed(&mut self, content: String) -> Option<TimerToken> {
        if !self.is_owner {
            debug!(doc = %self.id, "ignoring change on read-only document");
            return None;
        }
        if content::is_placeholder(&content) {
            debug!(doc = %self.id, "ignoring placeholder content");
            return None;
        }
        if serde_json::from_str::<Value>(&content).is_err() {
            // Scheduled anyway; the persistence client rejects it on save.
            debug!(doc = %self.id, "change carries unparseable content");
        }

        let token = self.scheduler.changed(content);
        self.status.apply(SyncEvent::Mutated);
        Some(token)
    }

    pub fn timer_fired(&mut self, token: TimerToken) -> TimerFire {
        let fire = self.scheduler.timer_fired(token);
        if matches!(fire, TimerFire::Issue(_)) {
            self.status.apply(SyncEvent::SaveStarted);
        }
        fire
    }

    /// Apply a successful save. Returns a follow-up save to issue.
    pub fn save_succeeded(&mut self, ticket: &SaveTicket) -> Option<SaveTicket> {
        let outcome = self.scheduler.save_finished(ticket, true);
        self.status.apply(SyncEvent::SaveSucceeded {
            covers_latest: outcome.covers_latest,
        });
        self.start_follow_up(outcome)
    }

    /// Apply a failed save. Returns a follow-up save to issue.
    pub fn save_failed(&mut self, ticket: &SaveTicket) -> Option<SaveTicket> {
        let outcome = self.scheduler.save_finished(ticket, false);
        self.status.apply(SyncEvent::SaveFailed);
        self.start_follow_up(outcome)
    }

    /// Start an explicit flush of the latest content (publish).
    ///
    /// Returns `None` while a save is in flight. The flush occupies the save
    /// slot and completes through [`save_succeeded`](Self::save_succeeded) or
    /// [`save_failed`](Self::save_failed) like any other save.
    pub fn begin_flush(&mut self) -> Option<SaveTicket> {
        let ticket = self.scheduler.flush(&self.initial)?;
        self.status.apply(SyncEvent::SaveStarted);
        Some(ticket)
    }

    /// Disarm the pending save while a destructive call is outstanding.
    pub fn hold(&mut self) -> bool {
        self.scheduler.hold()
    }

    /// Re-arm the save dropped by [`hold`](Self::hold).
    pub fn resume(&mut self) -> Option<TimerToken> {
        self.scheduler.rearm()
    }

    /// Drop pending work. Used right before the session is discarded.
    pub fn cancel(&mut self) {
        self.scheduler.cancel();
        self.status.apply(SyncEvent::Reset);
    }

    fn start_follow_up(&mut self, outcome: SaveOutcome) -> Option<SaveTicket> {
        let ticket = outcome.follow_up?;
        self.status.apply(SyncEvent::SaveStarted);
        Some(ticket)
    }
}
