//! The Document Sync Engine.
//!
//! [`SyncEngine`] is a cheap, cloneable handle around shared engine state.
//! It turns a stream of local mutations into debounced persistence calls and
//! exposes a status signal through a [`tokio::sync::watch`] channel.
//!
//! The pure pieces ([`EditSession`], [`SaveScheduler`](crate::SaveScheduler),
//! [`StatusMachine`](crate::StatusMachine), [`Directory`]) hold all of the
//! decision logic. This module only owns the timer and the spawned save tasks.
//! Every asynchronous continuation captures the [`Generation`] of the session
//! that started it and re-checks it under the lock before touching state.

use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, MutexGuard};
use quill_types::{DirectoryEntry, DocId, DocumentPatch, DocumentStatus, EntryPatch, SyncStatus};
use tokio::sync::watch;
use tokio::task::AbortHandle;
use tracing::{debug, warn};

use crate::client::{ClientError, PersistenceClient};
use crate::config::{Clock, SyncConfig, SystemClock};
use crate::directory::Directory;
use crate::scheduler::{SaveTicket, TimerFire, TimerToken};
use crate::session::{ActiveDocument, EditSession, Generation};

/// Handle to a sync engine. Clones share the same engine.
///
/// Must be created and used inside a Tokio runtime: the debounce timer and
/// save requests run as spawned tasks.
#[derive(Clone)]
pub struct SyncEngine {
    pub(crate) shared: Arc<Shared>,
}

pub(crate) struct Shared {
    pub(crate) client: Arc<dyn PersistenceClient>,
    pub(crate) clock: Arc<dyn Clock>,
    config: SyncConfig,
    state: Mutex<EngineState>,
    status_tx: watch::Sender<SyncStatus>,
}

impl Drop for Shared {
    fn drop(&mut self) {
        if let Some(timer) = self.state.get_mut().timer.take() {
            timer.abort();
        }
    }
}

#[derive(Default)]
pub(crate) struct EngineState {
    pub(crate) session: Option<EditSession>,
    pub(crate) directory: Directory,
    /// Bumped by every workspace change; an in-flight load whose ticket no
    /// longer matches is discarded.
    pub(crate) load_ticket: u64,
    /// Document currently being fetched by the initializer.
    pub(crate) loading: Option<DocId>,
    next_generation: u64,
    timer: Option<AbortHandle>,
}

impl SyncEngine {
    pub fn new(client: Arc<dyn PersistenceClient>, config: SyncConfig) -> Self {
        Self::with_clock(client, config, Arc::new(SystemClock))
    }

    pub fn with_clock(
        client: Arc<dyn PersistenceClient>,
        config: SyncConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let (status_tx, _) = watch::channel(SyncStatus::Idle);
        Self {
            shared: Arc::new(Shared {
                client,
                clock,
                config,
                state: Mutex::new(EngineState::default()),
                status_tx,
            }),
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.shared.config
    }

    /// Current status of the active document (`IDLE` when none is active).
    pub fn status(&self) -> SyncStatus {
        *self.shared.status_tx.borrow()
    }

    /// Receiver that observes every status change.
    pub fn subscribe(&self) -> watch::Receiver<SyncStatus> {
        self.shared.status_tx.subscribe()
    }

    pub fn active(&self) -> Option<ActiveDocument> {
        self.lock().session.as_ref().map(EditSession::snapshot)
    }

    pub fn active_id(&self) -> Option<DocId> {
        self.lock().session.as_ref().map(|s| s.id().clone())
    }

    /// Directory entries, newest first.
    pub fn directory_entries(&self) -> Vec<DirectoryEntry> {
        self.lock().directory.entries().to_vec()
    }

    /// Record a local mutation of the active document.
    ///
    /// Restarts the quiet-period timer. Ignored when no document is active,
    /// when the active document is not owned, and for placeholder content.
    pub fn notify_changed(&self, content: impl Into<String>) {
        let mut guard = self.lock();
        let state = &mut *guard;
        let Some(session) = state.session.as_mut() else {
            debug!("change ignored, no active document");
            return;
        };
        let Some(token) = session.notify_changed(content.into()) else {
            return;
        };
        let generation = session.generation();
        self.arm_timer(state, generation, token);
        self.publish_status(state);
    }

    /// Wait until nothing is pending or in flight and return that status.
    pub async fn wait_settled(&self) -> SyncStatus {
        let mut rx = self.subscribe();
        let status = match rx.wait_for(SyncStatus::is_settled).await {
            Ok(status) => *status,
            Err(_) => self.status(),
        };
        status
    }

    /// Deactivate the current document and abandon any in-flight load.
    ///
    /// A pending (not yet fired) save is dropped. An in-flight save is left
    /// to finish but its result is discarded.
    pub fn reset(&self) {
        let mut state = self.lock();
        state.load_ticket += 1;
        state.loading = None;
        self.deactivate(&mut state);
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, EngineState> {
        self.shared.state.lock()
    }

    /// Bind a new session, replacing whatever was active.
    pub(crate) fn activate(
        &self,
        state: &mut EngineState,
        id: DocId,
        title: String,
        doc_status: DocumentStatus,
        is_owner: bool,
        content: String,
    ) -> ActiveDocument {
        self.deactivate(state);
        state.next_generation += 1;
        let generation = Generation(state.next_generation);
        debug!(doc = %id, generation = generation.0, is_owner, "document activated");

        let session = EditSession::new(id, generation, title, doc_status, is_owner, content);
        let snapshot = session.snapshot();
        state.session = Some(session);
        self.publish_status(state);
        snapshot
    }

    pub(crate) fn deactivate(&self, state: &mut EngineState) {
        if let Some(timer) = state.timer.take() {
            timer.abort();
        }
        if let Some(mut session) = state.session.take() {
            if session.scheduler().is_armed() {
                debug!(doc = %session.id(), "dropping pending save");
            }
            session.cancel();
            debug!(doc = %session.id(), "document deactivated");
        }
        self.publish_status(state);
    }

    pub(crate) fn publish_status(&self, state: &EngineState) {
        let status = state
            .session
            .as_ref()
            .map_or(SyncStatus::Idle, EditSession::status);
        self.shared.status_tx.send_if_modified(|current| {
            if *current == status {
                false
            } else {
                *current = status;
                true
            }
        });
    }

    fn upgrade(weak: &Weak<Shared>) -> Option<Self> {
        weak.upgrade().map(|shared| Self { shared })
    }

    pub(crate) fn arm_timer(
        &self,
        state: &mut EngineState,
        generation: Generation,
        token: TimerToken,
    ) {
        if let Some(previous) = state.timer.take() {
            previous.abort();
        }

        let weak = Arc::downgrade(&self.shared);
        let quiet_period = self.shared.config.quiet_period;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(quiet_period).await;
            if let Some(engine) = Self::upgrade(&weak) {
                engine.timer_fired(generation, token);
            }
        });
        state.timer = Some(handle.abort_handle());
    }

    fn timer_fired(&self, generation: Generation, token: TimerToken) {
        let mut guard = self.lock();
        let state = &mut *guard;
        let Some(session) = state
            .session
            .as_mut()
            .filter(|s| s.generation() == generation)
        else {
            debug!(generation = generation.0, "timer fired for inactive document");
            return;
        };

        let id = session.id().clone();
        match session.timer_fired(token) {
            TimerFire::Stale => {}
            TimerFire::Deferred => {
                state.timer = None;
                debug!(doc = %id, "save in flight, follow-up queued");
            }
            TimerFire::Issue(ticket) => {
                state.timer = None;
                self.publish_status(state);
                self.spawn_save(generation, id, ticket);
            }
        }
    }

    fn spawn_save(&self, generation: Generation, id: DocId, ticket: SaveTicket) {
        debug!(doc = %id, revision = ticket.revision.0, "saving");
        let client = Arc::clone(&self.shared.client);
        let weak = Arc::downgrade(&self.shared);
        tokio::spawn(async move {
            let patch = DocumentPatch::content(ticket.content.clone());
            let result = client.patch(&id, &patch).await;
            if let Some(engine) = Self::upgrade(&weak) {
                engine.save_finished(generation, id, ticket, &result);
            }
        });
    }

    /// Apply the result of a save, autosave or flush, and issue the
    /// follow-up it asks for.
    pub(crate) fn save_finished(
        &self,
        generation: Generation,
        id: DocId,
        ticket: SaveTicket,
        result: &Result<(), ClientError>,
    ) {
        let mut guard = self.lock();
        let state = &mut *guard;
        let Some(session) = state
            .session
            .as_mut()
            .filter(|s| s.generation() == generation)
        else {
            debug!(doc = %id, revision = ticket.revision.0, "discarding stale save result");
            return;
        };

        let follow_up = match result {
            Ok(()) => {
                debug!(doc = %id, revision = ticket.revision.0, "saved");
                let follow_up = session.save_succeeded(&ticket);
                let now = self.shared.clock.now();
                state.directory.patch(&id, &EntryPatch::touched(now));
                follow_up
            }
            Err(err) => {
                warn!(doc = %id, revision = ticket.revision.0, error = %err, "save failed");
                session.save_failed(&ticket)
            }
        };

        self.publish_status(state);
        if let Some(next) = follow_up {
            self.spawn_save(generation, id, next);
        }
    }
}

impl fmt::Debug for SyncEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncEngine")
            .field("config", &self.shared.config)
            .field("status", &self.status())
            .field("active", &self.active_id())
            .finish()
    }
}
