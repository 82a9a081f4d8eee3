//! Mirror a local file into a document while it is being edited.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use quill_sync::content;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::commands::{connect, open_owned};
use crate::settings::Settings;

pub async fn watch_file(settings: &Settings, id: &str, file: &Path) -> Result<()> {
    let file = file
        .canonicalize()
        .with_context(|| format!("Failed to resolve {}", file.display()))?;
    let dir = file
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    let engine = connect(settings)?;
    let doc = open_owned(&engine, id).await?;
    println!(
        "Watching {} for \"{}\" ({id}), Ctrl+C to stop...",
        file.display(),
        doc.title
    );

    // Editors may replace the file on save; watch its directory instead.
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut watcher = RecommendedWatcher::new(
        move |res| {
            let _ = tx.send(res);
        },
        notify::Config::default(),
    )
    .context("Failed to initialize watcher")?;
    watcher
        .watch(&dir, RecursiveMode::NonRecursive)
        .with_context(|| format!("Failed to watch {}", dir.display()))?;

    let mut status_rx = engine.subscribe();
    loop {
        tokio::select! {
            event = rx.recv() => {
                let Some(event) = event else { break };
                match event {
                    Ok(ev) if is_write(&ev.kind) && ev.paths.iter().any(|p| p == &file) => {
                        match std::fs::read_to_string(&file) {
                            Ok(raw) if content::is_placeholder(&raw) => {
                                debug!(path = %file.display(), "skipping empty write");
                            }
                            Ok(raw) => engine.notify_changed(raw),
                            Err(err) => warn!(path = %file.display(), error = %err, "failed to read watched file"),
                        }
                    }
                    Ok(_) => {}
                    Err(err) => eprintln!("Watcher error: {err}"),
                }
            }
            changed = status_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let status = *status_rx.borrow_and_update();
                println!("{} {:<8} {}", Utc::now().format("%H:%M:%S"), status, status.label());
            }
            _ = tokio::signal::ctrl_c() => {
                break;
            }
        }
    }

    let status = engine.status();
    if !status.is_settled() {
        eprintln!("Stopped with unsaved changes ({status}).");
    }
    Ok(())
}

fn is_write(kind: &EventKind) -> bool {
    matches!(kind, EventKind::Create(_) | EventKind::Modify(_))
}
