//! The operation set and its commutative apply rules.
//!
//! Every operation addresses its container by `parent_created_at` and
//! carries its own ticket in `executed_at`. Apply never fails visibly:
//! unknown targets and tag mismatches are dropped, which together with
//! monotone tombstones makes replay idempotent.

mod add;
mod edit;
mod remove;
mod select;
mod set;

use serde::{Deserialize, Serialize};

use crate::json::Root;
use crate::time::Ticket;

pub use add::Add;
pub use edit::Edit;
pub use remove::Remove;
pub use select::Select;
pub use set::Set;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Operation {
    Set(Set),
    Add(Add),
    Remove(Remove),
    Edit(Edit),
    Select(Select),
}

impl Operation {
    pub fn parent_created_at(&self) -> Ticket {
        match self {
            Operation::Set(op) => op.parent_created_at(),
            Operation::Add(op) => op.parent_created_at(),
            Operation::Remove(op) => op.parent_created_at(),
            Operation::Edit(op) => op.parent_created_at(),
            Operation::Select(op) => op.parent_created_at(),
        }
    }

    pub fn executed_at(&self) -> Ticket {
        match self {
            Operation::Set(op) => op.executed_at(),
            Operation::Add(op) => op.executed_at(),
            Operation::Remove(op) => op.executed_at(),
            Operation::Edit(op) => op.executed_at(),
            Operation::Select(op) => op.executed_at(),
        }
    }

    pub fn execute(&self, root: &mut Root) {
        match self {
            Operation::Set(op) => op.execute(root),
            Operation::Add(op) => op.execute(root),
            Operation::Remove(op) => op.execute(root),
            Operation::Edit(op) => op.execute(root),
            Operation::Select(op) => op.execute(root),
        }
    }
}
