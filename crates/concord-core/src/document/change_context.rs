use crate::json::Root;
use crate::operation::Operation;
use crate::time::Ticket;

use super::change::Change;
use super::change_id::ChangeId;

/// Collects the operations of one local mutation while it executes.
///
/// Proxies issue tickets from the context (one delimiter per operation),
/// apply each operation to the root immediately and buffer it here; when
/// the mutator returns, the buffered operations become a [`Change`].
pub struct ChangeContext<'a> {
    id: ChangeId,
    message: String,
    delimiter: u32,
    operations: Vec<Operation>,
    root: &'a mut Root,
}

impl<'a> ChangeContext<'a> {
    pub(crate) fn new(id: ChangeId, message: String, root: &'a mut Root) -> Self {
        ChangeContext {
            id,
            message,
            delimiter: 0,
            operations: Vec::new(),
            root,
        }
    }

    pub(crate) fn id(&self) -> ChangeId {
        self.id
    }

    pub(crate) fn issue_ticket(&mut self) -> Ticket {
        self.delimiter += 1;
        self.id.ticket(self.delimiter)
    }

    pub(crate) fn root(&self) -> &Root {
        self.root
    }

    pub(crate) fn root_mut(&mut self) -> &mut Root {
        self.root
    }

    /// Buffers an operation that the caller already applied.
    pub(crate) fn push(&mut self, op: Operation) {
        self.operations.push(op);
    }

    /// Applies an operation to the root and buffers it.
    pub(crate) fn apply_and_push(&mut self, op: Operation) {
        op.execute(self.root);
        self.operations.push(op);
    }

    /// Finishes the mutation. A mutation that issued no operations commits
    /// no change.
    pub(crate) fn into_change(self) -> Option<Change> {
        if self.operations.is_empty() {
            return None;
        }
        Some(Change::new(self.id, self.message, self.operations))
    }
}
