//! Shared types for quill
//!
//! This crate provides the data model shared by the sync engine, the HTTP
//! client and the CLI: document identifiers, documents, directory entries,
//! partial updates and the user-facing sync status.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Title given to freshly created documents.
pub const UNTITLED: &str = "Untitled Draft";

/// Document identifier, assigned server-side at creation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocId(pub String);

impl DocId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for DocId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for DocId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Publication state of a document.
///
/// Advances `Draft -> Published`; the engine never moves it back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentStatus {
    #[default]
    Draft,
    Published,
}

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentStatus::Draft => "DRAFT",
            DocumentStatus::Published => "PUBLISHED",
        }
    }

    /// Parse a wire value. Anything other than `PUBLISHED` is a draft.
    pub fn parse(s: &str) -> Self {
        if s.eq_ignore_ascii_case("published") {
            DocumentStatus::Published
        } else {
            DocumentStatus::Draft
        }
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// User-facing synchronization status of the active document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncStatus {
    /// No document bound, or nothing happened since binding.
    #[default]
    Idle,
    /// Local edits exist that have not been sent.
    Unsaved,
    /// A save request is in flight.
    Saving,
    /// The latest local content is persisted.
    Saved,
    /// The last save request failed.
    Error,
}

impl SyncStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::Idle => "IDLE",
            SyncStatus::Unsaved => "UNSAVED",
            SyncStatus::Saving => "SAVING",
            SyncStatus::Saved => "SAVED",
            SyncStatus::Error => "ERROR",
        }
    }

    /// Short label for status indicators.
    pub fn label(&self) -> &'static str {
        match self {
            SyncStatus::Idle => "",
            SyncStatus::Unsaved => "Unsaved",
            SyncStatus::Saving => "Saving...",
            SyncStatus::Saved => "Saved",
            SyncStatus::Error => "Save failed",
        }
    }

    /// True when no save activity is pending or in flight.
    pub fn is_settled(&self) -> bool {
        matches!(self, SyncStatus::Idle | SyncStatus::Saved | SyncStatus::Error)
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// The unit of persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocId,
    pub title: String,
    /// Opaque serialized document tree. `None` when the store has nothing.
    pub content: Option<String>,
    pub status: DocumentStatus,
    pub updated_at: Option<DateTime<Utc>>,
    /// False for a document opened through a read-only share link.
    pub is_owner: bool,
}

/// Lightweight listing projection of a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    pub id: DocId,
    pub title: String,
    pub status: DocumentStatus,
    pub updated_at: Option<DateTime<Utc>>,
}

impl DirectoryEntry {
    /// Blank entry for a document that was just created.
    pub fn untitled(id: DocId, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            title: UNTITLED.to_string(),
            status: DocumentStatus::Draft,
            updated_at: Some(created_at),
        }
    }
}

impl From<&Document> for DirectoryEntry {
    fn from(doc: &Document) -> Self {
        Self {
            id: doc.id.clone(),
            title: doc.title.clone(),
            status: doc.status,
            updated_at: doc.updated_at,
        }
    }
}

/// Fields merged into a directory entry. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryPatch {
    pub title: Option<String>,
    pub status: Option<DocumentStatus>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl EntryPatch {
    pub fn touched(at: DateTime<Utc>) -> Self {
        Self {
            updated_at: Some(at),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.status.is_none() && self.updated_at.is_none()
    }

    /// Merge the set fields into `entry`. The id is never touched.
    pub fn apply_to(&self, entry: &mut DirectoryEntry) {
        if let Some(title) = &self.title {
            entry.title = title.clone();
        }
        if let Some(status) = self.status {
            entry.status = status;
        }
        if let Some(updated_at) = self.updated_at {
            entry.updated_at = Some(updated_at);
        }
    }
}

/// Partial update sent to the persistence layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<DocumentStatus>,
}

impl DocumentPatch {
    /// Autosave body: content only.
    pub fn content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    /// Flush body sent ahead of a publish call.
    pub fn publish(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            status: Some(DocumentStatus::Published),
            ..Self::default()
        }
    }
}

/// Actions understood by the text-transform service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TransformAction {
    Summarize,
    Continue,
    Title,
    FixGrammar,
}

impl TransformAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransformAction::Summarize => "summarize",
            TransformAction::Continue => "continue",
            TransformAction::Title => "title",
            TransformAction::FixGrammar => "fixGrammar",
        }
    }
}

impl fmt::Display for TransformAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}
