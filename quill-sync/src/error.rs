//! Engine-level error type.

use quill_types::DocId;
use thiserror::Error;

use crate::client::ClientError;

/// Failures of explicit engine commands (publish, rename, create, delete,
/// library load). Autosave never returns these; it reports through
/// [`quill_types::SyncStatus::Error`] instead.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("no document is active")]
    NoActiveDocument,

    #[error("document {0} is read-only in this session")]
    ReadOnly(DocId),

    #[error(transparent)]
    Client(#[from] ClientError),
}

pub type Result<T> = std::result::Result<T, SyncError>;
