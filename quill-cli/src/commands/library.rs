//! Library management: list, create, rename, publish, delete.

use std::path::Path;

use anyhow::{Context, Result};
use quill_sync::DocId;
use tracing::info;

use crate::commands::{connect, open, open_owned};
use crate::envelope::{self, CreatedData, LibraryData};
use crate::settings::Settings;

pub async fn list_documents(settings: &Settings, json: bool) -> Result<()> {
    let engine = connect(settings)?;
    engine
        .load_directory()
        .await
        .context("Failed to load library")?;
    let entries = engine.directory_entries();

    if json {
        return envelope::print(
            "library.list",
            LibraryData {
                total: entries.len(),
                entries,
            },
        );
    }

    if entries.is_empty() {
        println!("No documents.");
        return Ok(());
    }
    for entry in entries {
        println!(
            "{:<26} {:<9} {:<16} {}",
            entry.id,
            entry.status,
            envelope::format_timestamp(entry.updated_at),
            entry.title
        );
    }
    Ok(())
}

pub async fn create_document(settings: &Settings, json: bool) -> Result<()> {
    let engine = connect(settings)?;
    let id = engine
        .create_new()
        .await
        .context("Failed to create document")?;

    if json {
        return envelope::print("document.created", CreatedData { id: id.0 });
    }
    println!("{id}");
    Ok(())
}

pub async fn rename_document(settings: &Settings, id: &str, title: &str) -> Result<()> {
    let engine = connect(settings)?;
    open(&engine, id).await?;
    let renamed = engine
        .rename(title)
        .await
        .with_context(|| format!("Failed to rename document '{id}'"))?;

    if renamed {
        println!("Renamed {id} to \"{}\"", title.trim());
    } else {
        println!("Title unchanged.");
    }
    Ok(())
}

/// Publish `id`, optionally replacing its content with `file` first.
pub async fn publish_document(settings: &Settings, id: &str, file: Option<&Path>) -> Result<()> {
    let engine = connect(settings)?;
    open_owned(&engine, id).await?;

    if let Some(path) = file {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        engine.notify_changed(content);
    }

    let status = engine
        .publish()
        .await
        .with_context(|| format!("Failed to publish document '{id}'"))?;
    engine.reset();
    info!(doc = id, "publish complete");
    println!("{id}: {status}");
    Ok(())
}

pub async fn delete_document(settings: &Settings, id: &str) -> Result<()> {
    let engine = connect(settings)?;
    engine
        .remove_by_id(&DocId::new(id))
        .await
        .with_context(|| format!("Failed to delete document '{id}'"))?;
    println!("Deleted {id}");
    Ok(())
}
