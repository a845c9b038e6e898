//! The storage adapter contract and the records it persists.
//!
//! A backend must enforce four uniqueness constraints: client key, document
//! key, `(doc_id, server_seq)` for changes and for snapshots. Appending a
//! change the backend already holds with the same change id is an idempotent
//! replay; a different change claiming an occupied sequence is a conflict.

mod memory;

use std::collections::HashMap;
use std::fmt;
use std::time::SystemTime;

use async_trait::async_trait;
use thiserror::Error;

use concord_core::document::{Change, Checkpoint, DocumentKey};
use concord_core::time::ActorId;

pub use memory::MemoryStorage;

/// Backend-assigned document identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocId(pub u64);

impl fmt::Display for DocId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientStatus {
    Activated,
    Deactivated,
}

/// Persistent record of a client.
#[derive(Debug, Clone)]
pub struct ClientInfo {
    pub id: ActorId,
    pub key: String,
    pub status: ClientStatus,
    /// Checkpoints of the documents this client is attached to.
    pub checkpoints: HashMap<DocId, Checkpoint>,
    pub created_at: SystemTime,
    pub updated_at: SystemTime,
}

impl ClientInfo {
    pub fn checkpoint(&self, doc_id: DocId) -> Checkpoint {
        self.checkpoints
            .get(&doc_id)
            .copied()
            .unwrap_or(Checkpoint::INITIAL)
    }

    pub fn is_attached(&self, doc_id: DocId) -> bool {
        self.checkpoints.contains_key(&doc_id)
    }
}

/// Persistent record of a document.
#[derive(Debug, Clone)]
pub struct DocInfo {
    pub id: DocId,
    pub key: DocumentKey,
    pub owner: ActorId,
    /// Highest assigned server sequence.
    pub server_seq: u64,
    pub created_at: SystemTime,
    pub accessed_at: SystemTime,
}

/// A stored snapshot of a document tree.
#[derive(Debug, Clone)]
pub struct SnapshotInfo {
    pub doc_id: DocId,
    pub server_seq: u64,
    pub snapshot: Vec<u8>,
    pub created_at: SystemTime,
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("client not found: {0}")]
    ClientNotFound(String),
    #[error("document not found: {0}")]
    DocumentNotFound(String),
    #[error("snapshot not found for document {0}")]
    SnapshotNotFound(DocId),
    #[error("change {server_seq} already stored for document {doc_id}")]
    DuplicateServerSeq { doc_id: DocId, server_seq: u64 },
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
}

/// Storage adapter contract consumed by the service. All methods are the
/// suspension points of the system; nothing else in the push-pull critical
/// section awaits.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Upserts a client by key, (re)activating it.
    async fn find_or_create_client_info(&self, key: &str) -> Result<ClientInfo, StorageError>;

    async fn find_client_info_by_id(&self, id: ActorId) -> Result<ClientInfo, StorageError>;

    /// Flips the client to deactivated.
    async fn deactivate_client(&self, id: ActorId) -> Result<ClientInfo, StorageError>;

    /// Persists the client's per-document checkpoints after a push-pull.
    async fn update_client_info_after_push_pull(
        &self,
        client: &ClientInfo,
        doc: &DocInfo,
    ) -> Result<(), StorageError>;

    /// Finds a document by key, creating it owned by `client` when allowed.
    async fn find_or_create_doc_info(
        &self,
        client: &ClientInfo,
        key: &DocumentKey,
        create_if_missing: bool,
    ) -> Result<DocInfo, StorageError>;

    async fn find_doc_info_by_key(&self, key: &DocumentKey) -> Result<DocInfo, StorageError>;

    /// Persists the bumped `server_seq` of a document.
    async fn update_doc_info(&self, doc: &DocInfo) -> Result<(), StorageError>;

    /// Bulk-upserts changes keyed by `(doc_id, server_seq)`. Idempotent for
    /// replays of the same change; conflicting claims fail.
    async fn append_changes(&self, doc_id: DocId, changes: &[Change])
        -> Result<(), StorageError>;

    /// Stored changes with `from <= server_seq <= to`, ascending.
    async fn find_changes_between(
        &self,
        doc_id: DocId,
        from: u64,
        to: u64,
    ) -> Result<Vec<Change>, StorageError>;

    async fn write_snapshot(
        &self,
        doc_id: DocId,
        server_seq: u64,
        snapshot: Vec<u8>,
    ) -> Result<(), StorageError>;

    /// The snapshot with the highest `server_seq`, if any.
    async fn find_last_snapshot(&self, doc_id: DocId)
        -> Result<Option<SnapshotInfo>, StorageError>;
}
