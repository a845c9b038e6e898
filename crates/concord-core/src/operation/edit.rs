use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::json::{Element, Root, TextNodePos};
use crate::time::{ActorId, Ticket};

/// Replaces a range of a text element with new content.
///
/// `created_at_map_by_actor` records, per actor, the newest text node the
/// editing replica had observed inside the range, so replicas that already
/// hold concurrent inserts do not tombstone nodes the editor never saw.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edit {
    parent_created_at: Ticket,
    from: TextNodePos,
    to: TextNodePos,
    created_at_map_by_actor: HashMap<ActorId, Ticket>,
    content: String,
    executed_at: Ticket,
}

impl Edit {
    pub fn new(
        parent_created_at: Ticket,
        from: TextNodePos,
        to: TextNodePos,
        created_at_map_by_actor: HashMap<ActorId, Ticket>,
        content: &str,
        executed_at: Ticket,
    ) -> Self {
        Edit {
            parent_created_at,
            from,
            to,
            created_at_map_by_actor,
            content: content.to_string(),
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

    pub fn created_at_map_by_actor(&self) -> &HashMap<ActorId, Ticket> {
        &self.created_at_map_by_actor
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn executed_at(&self) -> Ticket {
        self.executed_at
    }

    pub fn execute(&self, root: &mut Root) {
        let Some(Element::Text(text)) = root.element_mut(self.parent_created_at) else {
            return;
        };
        text.edit(
            self.from,
            self.to,
            Some(&self.created_at_map_by_actor),
            &self.content,
            self.executed_at,
        );
    }
}
