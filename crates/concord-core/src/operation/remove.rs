use serde::{Deserialize, Serialize};

use crate::json::{Element, Root};
use crate::time::Ticket;

/// Tombstones a member of an object or array.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Remove {
    parent_created_at: Ticket,
    created_at: Ticket,
    executed_at: Ticket,
}

impl Remove {
    pub fn new(parent_created_at: Ticket, created_at: Ticket, executed_at: Ticket) -> Self {
        Remove {
            parent_created_at,
            created_at,
            executed_at,
        }
    }

    pub fn parent_created_at(&self) -> Ticket {
        self.parent_created_at
    }

    pub fn created_at(&self) -> Ticket {
        self.created_at
    }

    pub fn executed_at(&self) -> Ticket {
        self.executed_at
    }

    pub fn execute(&self, root: &mut Root) {
        let is_object = matches!(
            root.element(self.parent_created_at),
            Some(Element::Object(_))
        );
        let is_array = matches!(
            root.element(self.parent_created_at),
            Some(Element::Array(_))
        );
        if is_object {
            root.delete_element(self.created_at, self.executed_at);
        } else if is_array {
            let Some(Element::Array(arr)) = root.element_mut(self.parent_created_at) else {
                return;
            };
            let removed = arr.remove_by_created_at(self.created_at, self.executed_at);
            if removed.is_some() {
                root.delete_element(self.created_at, self.executed_at);
            }
        }
    }
}
