use serde::{Deserialize, Serialize};

use crate::json::Root;
use crate::operation::Operation;

use super::change_id::ChangeId;

/// The unit of atomic mutation: a batch of operations committed together by
/// one actor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Change {
    id: ChangeId,
    message: String,
    operations: Vec<Operation>,
}

impl Change {
    pub fn new(id: ChangeId, message: String, operations: Vec<Operation>) -> Self {
        Change {
            id,
            message,
            operations,
        }
    }

    pub fn id(&self) -> ChangeId {
        self.id
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn server_seq(&self) -> u64 {
        self.id.server_seq()
    }

    pub fn set_server_seq(&mut self, server_seq: u64) {
        self.id = self.id.with_server_seq(server_seq);
    }

    /// Applies every operation to the root. Unknown targets drop silently.
    pub fn execute(&self, root: &mut Root) {
        for op in &self.operations {
            op.execute(root);
        }
    }

    /// Structural sanity of a change arriving at the push boundary. A
    /// well-formed change carries at least one operation, and every
    /// operation was stamped by the change's own actor.
    pub fn is_well_formed(&self) -> bool {
        !self.operations.is_empty()
            && self
                .operations
                .iter()
                .all(|op| op.executed_at().actor() == self.id.actor())
    }
}
