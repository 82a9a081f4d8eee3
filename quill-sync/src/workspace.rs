//! Workspace initialization: binding the engine to a requested document.
//!
//! The decision of what to do is a pure function ([`plan`]); the fetch and
//! the race against later requests live on [`SyncEngine::initialize`].

use quill_types::DocId;
use tracing::{debug, info, warn};

use crate::content::{self, ContentKind};
use crate::engine::SyncEngine;
use crate::session::ActiveDocument;

/// What the initializer does for a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitPlan {
    /// No id requested: drop the active document.
    Deactivate,
    /// The requested id is already active.
    Keep,
    /// Load the requested id from the store.
    Fetch(DocId),
}

pub fn plan(requested: Option<&DocId>, active: Option<&DocId>) -> InitPlan {
    match requested {
        None => InitPlan::Deactivate,
        Some(id) if active == Some(id) => InitPlan::Keep,
        Some(id) => InitPlan::Fetch(id.clone()),
    }
}

/// Result of [`SyncEngine::initialize`].
#[derive(Debug, Clone, PartialEq)]
pub enum InitOutcome {
    /// Nothing is active any more.
    Deactivated,
    /// The requested document was already active; nothing changed.
    Unchanged,
    Activated(ActiveDocument),
    /// The store does not have the document, or refuses to show it.
    NotFound(DocId),
    LoadFailed { id: DocId, reason: String },
    /// A later request took over before this load resolved. Its result was
    /// dropped.
    Superseded,
}

impl InitOutcome {
    /// True when a document is bound after this outcome.
    pub fn is_active(&self) -> bool {
        matches!(self, InitOutcome::Unchanged | InitOutcome::Activated(_))
    }
}

impl SyncEngine {
    /// Make `requested` the active document.
    ///
    /// Re-requesting the active id is a no-op that keeps pending saves alive.
    /// Any other request deactivates the current document right away, so
    /// nothing scheduled for it can fire while the new one loads. When two
    /// loads overlap only the most recent one may activate.
    pub async fn initialize(&self, requested: Option<DocId>) -> InitOutcome {
        let (ticket, id) = {
            let mut state = self.lock();
            let active = state.session.as_ref().map(|s| s.id().clone());
            match plan(requested.as_ref(), active.as_ref()) {
                InitPlan::Keep => return InitOutcome::Unchanged,
                InitPlan::Deactivate => {
                    state.load_ticket += 1;
                    state.loading = None;
                    self.deactivate(&mut state);
                    return InitOutcome::Deactivated;
                }
                InitPlan::Fetch(id) => {
                    state.load_ticket += 1;
                    state.loading = Some(id.clone());
                    self.deactivate(&mut state);
                    (state.load_ticket, id)
                }
            }
        };

        info!(doc = %id, "loading document");
        let fetched = self.shared.client.get(&id).await;

        let mut state = self.lock();
        if state.load_ticket != ticket {
            debug!(doc = %id, "discarding superseded load");
            return InitOutcome::Superseded;
        }
        state.loading = None;

        match fetched {
            Ok(doc) => {
                let kind = content::classify(doc.content.as_deref());
                if kind != ContentKind::Valid {
                    debug!(doc = %id, ?kind, "stored content unusable, starting from empty state");
                }
                let initial = content::sanitize(doc.content.as_deref());
                let snapshot =
                    self.activate(&mut state, id, doc.title, doc.status, doc.is_owner, initial);
                InitOutcome::Activated(snapshot)
            }
            Err(err) if err.is_not_found_like() => {
                warn!(doc = %id, error = %err, "document not found");
                InitOutcome::NotFound(id)
            }
            Err(err) => {
                warn!(doc = %id, error = %err, "failed to load document");
                InitOutcome::LoadFailed {
                    id,
                    reason: err.to_string(),
                }
            }
        }
    }
}
