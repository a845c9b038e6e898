use serde::{Deserialize, Serialize};

use super::change::Change;
use super::checkpoint::Checkpoint;
use super::key::DocumentKey;

/// The unit of push-pull synchronisation: a replica's pending changes (or
/// the server's response changes) plus the sender's checkpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangePack {
    document_key: DocumentKey,
    checkpoint: Checkpoint,
    changes: Vec<Change>,
}

impl ChangePack {
    pub fn new(document_key: DocumentKey, checkpoint: Checkpoint, changes: Vec<Change>) -> Self {
        ChangePack {
            document_key,
            checkpoint,
            changes,
        }
    }

    pub fn document_key(&self) -> &DocumentKey {
        &self.document_key
    }

    pub fn checkpoint(&self) -> Checkpoint {
        self.checkpoint
    }

    pub fn changes(&self) -> &[Change] {
        &self.changes
    }

    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty()
    }
}
