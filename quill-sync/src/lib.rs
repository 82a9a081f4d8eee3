//! Document synchronization engine for quill.
//!
//! The engine sits between an editor that produces a stream of local
//! mutations and a remote [`PersistenceClient`]. It debounces saves, keeps a
//! single status signal honest about what has reached the store, caches the
//! document directory and binds the workspace to one active document at a
//! time.
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use quill_sync::{PersistenceClient, SyncConfig, SyncEngine};
//! # async fn run(client: Arc<dyn PersistenceClient>) {
//! let engine = SyncEngine::new(client, SyncConfig::default());
//! engine.load_directory().await.ok();
//! let id = engine.create_new().await.expect("create");
//! engine.notify_changed(r#"{"root":{"children":[]}}"#);
//! let status = engine.wait_settled().await;
//! println!("{id}: {status}");
//! # }
//! ```

pub mod client;
pub mod config;
pub mod content;
pub mod directory;
pub mod engine;
pub mod error;
pub mod library;
pub mod scheduler;
pub mod session;
pub mod status;
pub mod workspace;

pub use client::{ClientError, PersistenceClient};
pub use config::{Clock, FixedClock, SyncConfig, SystemClock, DEFAULT_QUIET_PERIOD};
pub use directory::Directory;
pub use engine::SyncEngine;
pub use error::{Result, SyncError};
pub use library::RemoveOutcome;
pub use scheduler::{Revision, SaveScheduler, SaveTicket, TimerFire, TimerToken};
pub use session::{ActiveDocument, EditSession, Generation};
pub use status::{StatusMachine, SyncEvent};
pub use workspace::{InitOutcome, InitPlan};

pub use quill_types::{
    DirectoryEntry, DocId, Document, DocumentPatch, DocumentStatus, EntryPatch, SyncStatus,
};
