//! CLI command implementations.

pub mod config;
pub mod document;
pub mod library;
pub mod transform;
pub mod watch;

pub use config::show_config;
pub use document::{push_file, show_document};
pub use library::{create_document, delete_document, list_documents, publish_document, rename_document};
pub use transform::transform_text;
pub use watch::watch_file;

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use quill_client::HttpPersistence;
use quill_sync::{ActiveDocument, DocId, InitOutcome, SyncEngine};

use crate::settings::Settings;

/// Build an engine talking to the configured backend.
pub(crate) fn connect(settings: &Settings) -> Result<SyncEngine> {
    let client = HttpPersistence::new(settings.client_config())
        .context("Failed to initialize HTTP client")?;
    Ok(SyncEngine::new(Arc::new(client), settings.sync_config()))
}

/// Make `id` the active document or explain why it cannot be.
pub(crate) async fn open(engine: &SyncEngine, id: &str) -> Result<ActiveDocument> {
    match engine.initialize(Some(DocId::new(id))).await {
        InitOutcome::Activated(doc) => Ok(doc),
        InitOutcome::NotFound(id) => bail!("Document '{id}' not found"),
        InitOutcome::LoadFailed { id, reason } => {
            bail!("Failed to load document '{id}': {reason}")
        }
        other => bail!("Document '{id}' could not be opened ({other:?})"),
    }
}

/// Like [`open`], but refuse documents this user cannot edit.
pub(crate) async fn open_owned(engine: &SyncEngine, id: &str) -> Result<ActiveDocument> {
    let doc = open(engine, id).await?;
    if !doc.is_owner {
        bail!("Document '{id}' is read-only for this account");
    }
    Ok(doc)
}
