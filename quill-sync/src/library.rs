//! Explicit document commands: library load, create, delete, rename and
//! publish.
//!
//! Unlike autosave these are awaited by the caller and report failure as a
//! [`SyncError`]. Each keeps the directory cache in step with the store.

use quill_types::{
    DirectoryEntry, DocId, DocumentPatch, DocumentStatus, EntryPatch, UNTITLED,
};
use tracing::{debug, info, warn};

use crate::client::ClientError;
use crate::content;
use crate::engine::SyncEngine;
use crate::error::{Result, SyncError};
use crate::scheduler::SaveTicket;
use crate::session::Generation;

/// Result of [`SyncEngine::remove_by_id`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoveOutcome {
    /// The removed document was the active one and has been deactivated.
    pub was_active: bool,
}

impl SyncEngine {
    /// Replace the directory cache with the store's listing.
    pub async fn load_directory(&self) -> Result<usize> {
        let entries = self.shared.client.list().await.map_err(|err| {
            warn!(error = %err, "could not load library");
            err
        })?;
        let mut state = self.lock();
        state.directory.load(entries);
        debug!(count = state.directory.len(), "library loaded");
        Ok(state.directory.len())
    }

    /// Create a document and make it active.
    ///
    /// The new document is owned, starts from the empty state and is listed
    /// first in the directory. No fetch is made.
    pub async fn create_new(&self) -> Result<DocId> {
        let id = self.shared.client.create().await.map_err(|err| {
            warn!(error = %err, "failed to create document");
            err
        })?;
        let now = self.shared.clock.now();

        let mut state = self.lock();
        state
            .directory
            .insert(DirectoryEntry::untitled(id.clone(), now));
        state.load_ticket += 1;
        state.loading = None;
        self.activate(
            &mut state,
            id.clone(),
            UNTITLED.to_string(),
            DocumentStatus::Draft,
            true,
            content::empty_state().to_string(),
        );
        info!(doc = %id, "created document");
        Ok(id)
    }

    /// Delete a document from the store and the directory.
    ///
    /// Deleting the active document deactivates it; anything pending for it
    /// is dropped and late save results are discarded. The pending save is
    /// held back while the delete is outstanding and re-armed if it fails.
    pub async fn remove_by_id(&self, id: &DocId) -> Result<RemoveOutcome> {
        let held = {
            let mut state = self.lock();
            state
                .session
                .as_mut()
                .filter(|s| s.id() == id)
                .and_then(|s| s.hold().then(|| s.generation()))
        };

        if let Err(err) = self.shared.client.delete(id).await {
            warn!(doc = %id, error = %err, "failed to delete document");
            if let Some(generation) = held {
                self.resume_held(generation);
            }
            return Err(err.into());
        }

        let mut state = self.lock();
        state.directory.remove(id);
        if state.loading.as_ref() == Some(id) {
            state.load_ticket += 1;
            state.loading = None;
        }
        let was_active = state.session.as_ref().is_some_and(|s| s.id() == id);
        if was_active {
            state.load_ticket += 1;
            self.deactivate(&mut state);
        }
        info!(doc = %id, was_active, "deleted document");
        Ok(RemoveOutcome { was_active })
    }

    fn resume_held(&self, generation: Generation) {
        let mut guard = self.lock();
        let state = &mut *guard;
        let Some(token) = state
            .session
            .as_mut()
            .filter(|s| s.generation() == generation)
            .and_then(|s| s.resume())
        else {
            return;
        };
        self.arm_timer(state, generation, token);
    }

    /// Rename the active document.
    ///
    /// The title is trimmed. Returns `Ok(false)` without contacting the store
    /// when it is empty or unchanged.
    pub async fn rename(&self, title: &str) -> Result<bool> {
        let title = title.trim();
        let (generation, id) = {
            let state = self.lock();
            let session = state.session.as_ref().ok_or(SyncError::NoActiveDocument)?;
            if !session.is_owner() {
                return Err(SyncError::ReadOnly(session.id().clone()));
            }
            if title.is_empty() || title == session.title() {
                return Ok(false);
            }
            (session.generation(), session.id().clone())
        };

        self.shared
            .client
            .patch(&id, &DocumentPatch::title(title))
            .await
            .map_err(|err| {
                warn!(doc = %id, error = %err, "failed to rename document");
                err
            })?;

        let mut guard = self.lock();
        let state = &mut *guard;
        state.directory.patch(
            &id,
            &EntryPatch {
                title: Some(title.to_string()),
                ..EntryPatch::default()
            },
        );
        match state
            .session
            .as_mut()
            .filter(|s| s.generation() == generation)
        {
            Some(session) => session.set_title(title.to_string()),
            None => debug!(doc = %id, "rename finished after document switch"),
        }
        info!(doc = %id, title, "renamed document");
        Ok(true)
    }

    /// Flush the latest content and publish the active document.
    ///
    /// The flush waits for an in-flight autosave, then takes the save slot and
    /// sends the content with `PUBLISHED` status; the publish call follows.
    /// Fails with [`SyncError::NoActiveDocument`] if the document is switched
    /// away while waiting.
    pub async fn publish(&self) -> Result<DocumentStatus> {
        let (generation, id, ticket) = self.claim_flush().await?;

        let client = &self.shared.client;
        let fail = |err: ClientError| {
            warn!(doc = %id, error = %err, "failed to publish document");
            err
        };
        let flushed = client
            .patch(&id, &DocumentPatch::publish(ticket.content.clone()))
            .await;
        self.save_finished(generation, id.clone(), ticket, &flushed);
        flushed.map_err(fail)?;

        let returned = client.publish(&id).await.map_err(fail)?;
        // Publication never goes back to draft.
        let status = match returned {
            DocumentStatus::Published => DocumentStatus::Published,
            DocumentStatus::Draft => {
                debug!(doc = %id, "store reported draft after publish");
                DocumentStatus::Published
            }
        };
        let now = self.shared.clock.now();

        let mut guard = self.lock();
        let state = &mut *guard;
        state.directory.patch(
            &id,
            &EntryPatch {
                status: Some(status),
                updated_at: Some(now),
                ..EntryPatch::default()
            },
        );
        match state
            .session
            .as_mut()
            .filter(|s| s.generation() == generation)
        {
            Some(session) => session.set_doc_status(status),
            None => debug!(doc = %id, "publish finished after document switch"),
        }
        info!(doc = %id, "published document");
        Ok(status)
    }

    /// Wait for the save slot of the active document and take it.
    async fn claim_flush(&self) -> Result<(Generation, DocId, SaveTicket)> {
        let mut rx = self.subscribe();
        let mut pinned: Option<Generation> = None;
        loop {
            {
                let mut guard = self.lock();
                let state = &mut *guard;
                let session = state
                    .session
                    .as_mut()
                    .filter(|s| pinned.map_or(true, |g| s.generation() == g))
                    .ok_or(SyncError::NoActiveDocument)?;
                if !session.is_owner() {
                    return Err(SyncError::ReadOnly(session.id().clone()));
                }
                let generation = session.generation();
                let id = session.id().clone();
                pinned = Some(generation);

                if let Some(ticket) = session.begin_flush() {
                    debug!(doc = %id, revision = ticket.revision.0, "flushing");
                    self.publish_status(state);
                    return Ok((generation, id, ticket));
                }
                debug!(doc = %id, "waiting for in-flight save");
            }
            // An in-flight save always holds the status at SAVING.
            if rx.changed().await.is_err() {
                return Err(SyncError::NoActiveDocument);
            }
        }
    }
}
