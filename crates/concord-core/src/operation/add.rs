use serde::{Deserialize, Serialize};

use crate::json::{Element, Root};
use crate::time::Ticket;

/// Inserts a freshly created element into an array after the element
/// identified by `prev_created_at`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Add {
    parent_created_at: Ticket,
    prev_created_at: Ticket,
    value: Element,
    executed_at: Ticket,
}

impl Add {
    pub fn new(
        parent_created_at: Ticket,
        prev_created_at: Ticket,
        value: Element,
        executed_at: Ticket,
    ) -> Self {
        Add {
            parent_created_at,
            prev_created_at,
            value,
            executed_at,
        }
    }

    pub fn parent_created_at(&self) -> Ticket {
        self.parent_created_at
    }

    pub fn prev_created_at(&self) -> Ticket {
        self.prev_created_at
    }

    pub fn value(&self) -> &Element {
        &self.value
    }

    pub fn executed_at(&self) -> Ticket {
        self.executed_at
    }

    pub fn execute(&self, root: &mut Root) {
        let Some(Element::Array(arr)) = root.element_mut(self.parent_created_at) else {
            return;
        };
        let inserted = arr.insert_after(self.prev_created_at, self.value.created_at());
        if inserted {
            root.register(self.value.clone());
        }
    }
}
