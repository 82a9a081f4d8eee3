//! Single-document commands: show and push.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use quill_sync::content::{self, ContentKind};
use quill_sync::SyncStatus;
use serde_json::Value;

use crate::commands::{connect, open, open_owned};
use crate::envelope;
use crate::settings::Settings;

pub async fn show_document(settings: &Settings, id: &str, json: bool) -> Result<()> {
    let engine = connect(settings)?;
    let doc = open(&engine, id).await?;

    if json {
        return envelope::print("document.full", &doc);
    }

    println!("Title:  {}", doc.title);
    println!("Status: {}", doc.status);
    println!(
        "Access: {}",
        if doc.is_owner { "owner" } else { "read-only" }
    );
    println!();
    let pretty = serde_json::from_str::<Value>(&doc.content)
        .and_then(|value| serde_json::to_string_pretty(&value))
        .unwrap_or(doc.content);
    println!("{pretty}");
    Ok(())
}

/// Replace the content of `id` with `file` and wait until it is saved.
pub async fn push_file(settings: &Settings, id: &str, file: &Path) -> Result<()> {
    let raw = fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    match content::classify(Some(&raw)) {
        ContentKind::Valid => {}
        ContentKind::Unparseable => bail!("{} is not a valid JSON document", file.display()),
        ContentKind::Missing | ContentKind::Empty => {
            bail!("{} holds no document content", file.display())
        }
    }

    let engine = connect(settings)?;
    let doc = open_owned(&engine, id).await?;
    if content::sanitize(Some(&raw)) == doc.content {
        println!("{id} is already up to date.");
        return Ok(());
    }

    engine.notify_changed(raw);
    eprintln!(
        "Saving {id} after {} ms of quiet...",
        engine.config().quiet_period.as_millis()
    );
    match engine.wait_settled().await {
        SyncStatus::Saved => {
            println!("{id}: {}", SyncStatus::Saved.label());
            Ok(())
        }
        SyncStatus::Error => bail!("Saving document '{id}' failed"),
        other => bail!("Document '{id}' ended in unexpected state {other}"),
    }
}
