//! Persistence Client contract consumed by the engine.

use async_trait::async_trait;
use quill_types::{DirectoryEntry, DocId, Document, DocumentPatch, DocumentStatus};
use thiserror::Error;

/// Failures reported by a persistence or transform backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Network failure or server-side 5xx.
    #[error("transient failure: {0}")]
    Transient(String),

    #[error("request rejected with status {status}: {message}")]
    Rejected { status: u16, message: String },

    /// Input refused before any request was made.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("failed to encode request: {0}")]
    Encode(String),

    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl ClientError {
    /// Errors that mean the document cannot be opened at all.
    pub fn is_not_found_like(&self) -> bool {
        matches!(self, ClientError::NotFound(_) | ClientError::Forbidden(_))
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, ClientError::Transient(_))
    }
}

/// Remote store of documents.
///
/// Implementations may fail transiently (network) or permanently (4xx).
/// The engine never retries on its own and imposes no timeout; both are the
/// transport's business.
#[async_trait]
pub trait PersistenceClient: Send + Sync {
    async fn list(&self) -> Result<Vec<DirectoryEntry>, ClientError>;

    async fn get(&self, id: &DocId) -> Result<Document, ClientError>;

    /// Create an empty document and return its server-assigned id.
    async fn create(&self) -> Result<DocId, ClientError>;

    /// Partial update, used for autosave, rename and the publish flush.
    async fn patch(&self, id: &DocId, fields: &DocumentPatch) -> Result<(), ClientError>;

    async fn publish(&self, id: &DocId) -> Result<DocumentStatus, ClientError>;

    async fn delete(&self, id: &DocId) -> Result<(), ClientError>;
}
