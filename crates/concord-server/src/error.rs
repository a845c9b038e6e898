use concord_core::time::ActorId;
use concord_core::CoreError;
use thiserror::Error;

use crate::storage::StorageError;

pub type ServerResult<T> = Result<T, ServerError>;

/// Error taxonomy of the service surface.
///
/// CRDT apply never fails visibly; what can fail is lookup, validation,
/// checkpoint agreement and storage. Transient storage failures may be
/// retried by the caller; an internal invariant violation may not.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("client not found: {0}")]
    ClientNotFound(String),
    #[error("document not found: {0}")]
    DocumentNotFound(String),
    #[error("snapshot not found: {0}")]
    SnapshotNotFound(String),
    #[error("client {0} is not active")]
    ClientNotActive(ActorId),
    #[error("client {client} is not attached to document {document}")]
    DocumentNotAttached { client: ActorId, document: String },
    #[error("invalid change pack: {0}")]
    InvalidChangePack(String),
    #[error("checkpoint conflict: {0}")]
    Conflict(String),
    #[error("transient storage failure: {0}")]
    Transient(String),
    #[error("codec failure: {0}")]
    Codec(#[from] CoreError),
    #[error("internal invariant violated: {0}")]
    Internal(String),
}

impl From<StorageError> for ServerError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::ClientNotFound(key) => ServerError::ClientNotFound(key),
            StorageError::DocumentNotFound(key) => ServerError::DocumentNotFound(key),
            StorageError::SnapshotNotFound(doc_id) => {
                ServerError::SnapshotNotFound(doc_id.to_string())
            }
            StorageError::DuplicateServerSeq { .. } => ServerError::Conflict(err.to_string()),
            StorageError::Unavailable(msg) => ServerError::Transient(msg),
        }
    }
}
