use serde::{Deserialize, Serialize};

use crate::json::{Element, Root, TextNodePos};
use crate::time::Ticket;

/// Publishes the acting replica's selection range on a text element.
/// Never changes text content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Select {
    parent_created_at: Ticket,
    from: TextNodePos,
    to: TextNodePos,
    executed_at: Ticket,
}

impl Select {
    pub fn new(
        parent_created_at: Ticket,
        from: TextNodePos,
        to: TextNodePos,
        executed_at: Ticket,
    ) -> Self {
        Select {
            parent_created_at,
            from,
            to,
            executed_at,
        }
    }

    pub fn parent_created_at(&self) -> Ticket {
        self.parent_created_at
    }

    pub fn from(&self) -> TextNodePos {
        self.from
    }

    pub fn to(&self) -> TextNodePos {
        self.to
    }

    pub fn executed_at(&self) -> Ticket {
        self.executed_at
    }

    pub fn execute(&self, root: &mut Root) {
        let Some(Element::Text(text)) = root.element_mut(self.parent_created_at) else {
            return;
        };
        text.select(self.from, self.to, self.executed_at);
    }
}
