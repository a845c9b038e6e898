use std::collections::HashMap;

use crate::time::{ActorId, Ticket};

use super::rga_tree_split::{RgaTreeSplit, TextNodeId, TextNodePos};

/// A published selection range of one actor. Carries the ticket of the
/// publishing operation so stale selections never overwrite newer ones.
#[derive(Debug, Clone, Copy)]
pub struct Selection {
    from: TextNodePos,
    to: TextNodePos,
    updated_at: Ticket,
}

impl Selection {
    pub fn from(&self) -> TextNodePos {
        self.from
    }

    pub fn to(&self) -> TextNodePos {
        self.to
    }

    pub fn updated_at(&self) -> Ticket {
        self.updated_at
    }
}

/// Collaborative text element.
#[derive(Debug, Clone)]
pub struct Text {
    rga: RgaTreeSplit,
    selections: HashMap<ActorId, Selection>,
    created_at: Ticket,
    deleted_at: Option<Ticket>,
}

impl Text {
    pub fn new(created_at: Ticket) -> Self {
        Text {
            rga: RgaTreeSplit::new(),
            selections: HashMap::new(),
            created_at,
            deleted_at: None,
        }
    }

    /// Resolves a character index to a stable position.
    pub fn find_pos(&mut self, index: usize) -> TextNodePos {
        self.rga.find_pos(index)
    }

    /// Applies an edit; see [`RgaTreeSplit::edit`]. Returns `None` when the
    /// edit references unknown nodes and is dropped.
    pub fn edit(
        &mut self,
        from: TextNodePos,
        to: TextNodePos,
        latest_by_actor: Option<&HashMap<ActorId, Ticket>>,
        content: &str,
        edited_at: Ticket,
    ) -> Option<HashMap<ActorId, Ticket>> {
        self.rga
            .edit(from, to, latest_by_actor, content, edited_at)
            .map(|(_, created_map)| created_map)
    }

    /// Publishes the selection of the acting replica. Ignored when a newer
    /// selection from the same actor is already present.
    pub fn select(&mut self, from: TextNodePos, to: TextNodePos, updated_at: Ticket) {
        let actor = updated_at.actor();
        match self.selections.get(&actor) {
            Some(current) if updated_at <= current.updated_at => {}
            _ => {
                self.selections.insert(
                    actor,
                    Selection {
                        from,
                        to,
                        updated_at,
                    },
                );
            }
        }
    }

    pub fn selection(&self, actor: ActorId) -> Option<&Selection> {
        self.selections.get(&actor)
    }

    /// The visible text.
    pub fn value(&self) -> String {
        self.rga.value()
    }

    /// Visible length in characters.
    pub fn len(&self) -> usize {
        self.rga.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rga.is_empty()
    }

    /// Sequence nodes in order, tombstones included. Exposed for the
    /// snapshot codec and diagnostics.
    pub fn nodes(&self) -> Vec<&super::rga_tree_split::TextNode> {
        self.rga.nodes()
    }

    pub(crate) fn append(&mut self, id: TextNodeId, content: String, removed_at: Option<Ticket>) {
        self.rga.append(id, content, removed_at);
    }

    pub fn created_at(&self) -> Ticket {
        self.created_at
    }

    pub fn deleted_at(&self) -> Option<Ticket> {
        self.deleted_at
    }

    pub fn delete(&mut self, deleted_at: Ticket) -> bool {
        match self.deleted_at {
            Some(current) if deleted_at <= current => false,
            _ => {
                self.deleted_at = Some(deleted_at);
                true
            }
        }
    }

    /// JSON string literal of the visible text.
    pub fn marshal(&self) -> String {
        serde_json::json!(self.value()).to_string()
    }
}
