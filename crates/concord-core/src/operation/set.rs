use serde::{Deserialize, Serialize};

use crate::json::{Element, Root};
use crate::time::Ticket;

/// Sets a key of an object to a freshly created element. The previous
/// winner, if any, stays registered until snapshot compaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Set {
    parent_created_at: Ticket,
    key: String,
    value: Element,
    executed_at: Ticket,
}

impl Set {
    pub fn new(parent_created_at: Ticket, key: &str, value: Element, executed_at: Ticket) -> Self {
        Set {
            parent_created_at,
            key: key.to_string(),
            value,
            executed_at,
        }
    }

    pub fn parent_created_at(&self) -> Ticket {
        self.parent_created_at
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &Element {
        &self.value
    }

    pub fn executed_at(&self) -> Ticket {
        self.executed_at
    }

    pub fn execute(&self, root: &mut Root) {
        if !matches!(root.element(self.parent_created_at), Some(Element::Object(_))) {
            return;
        }
        root.register(self.value.clone());
        let Some(Element::Object(obj)) = root.element_mut(self.parent_created_at) else {
            return;
        };
        obj.set(&self.key, self.value.created_at());
    }
}
