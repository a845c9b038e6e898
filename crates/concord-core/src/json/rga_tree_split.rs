use std::collections::{BTreeMap, HashMap};
use std::fmt;

use concord_splay::{NodeRef, SplayTree, SplayValue};
use serde::{Deserialize, Serialize};

use crate::time::{ActorId, Ticket};

/// Identifier of a text node: the edit ticket that created the original run
/// plus the character offset at which this node was split off it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct TextNodeId {
    created_at: Ticket,
    offset: u32,
}

impl TextNodeId {
    pub fn new(created_at: Ticket, offset: u32) -> Self {
        TextNodeId { created_at, offset }
    }

    pub fn created_at(&self) -> Ticket {
        self.created_at
    }

    pub fn offset(&self) -> u32 {
        self.offset
    }
}

/// A position inside the text: a node id and a character offset within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextNodePos {
    id: TextNodeId,
    relative_offset: u32,
}

impl TextNodePos {
    pub fn new(id: TextNodeId, relative_offset: u32) -> Self {
        TextNodePos {
            id,
            relative_offset,
        }
    }

    pub fn id(&self) -> TextNodeId {
        self.id
    }

    pub fn relative_offset(&self) -> u32 {
        self.relative_offset
    }

    fn absolute(&self) -> TextNodeId {
        TextNodeId::new(self.id.created_at, self.id.offset + self.relative_offset)
    }
}

/// A run of text with its tombstone and linkage. List links (`prev`/`next`)
/// follow sequence order; insertion links (`ins_prev`/`ins_next`) connect
/// the pieces of a split run.
#[derive(Debug, Clone)]
pub struct TextNode {
    id: TextNodeId,
    content: String,
    removed_at: Option<Ticket>,
    prev: Option<NodeRef>,
    next: Option<NodeRef>,
    ins_prev: Option<NodeRef>,
    ins_next: Option<NodeRef>,
}

impl TextNode {
    fn new(id: TextNodeId, content: String) -> Self {
        TextNode {
            id,
            content,
            removed_at: None,
            prev: None,
            next: None,
            ins_prev: None,
            ins_next: None,
        }
    }

    pub fn id(&self) -> TextNodeId {
        self.id
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn removed_at(&self) -> Option<Ticket> {
        self.removed_at
    }

    fn content_len(&self) -> usize {
        self.content.chars().count()
    }

    fn can_delete(&self, edited_at: Ticket, latest_created_at: Ticket) -> bool {
        self.id.created_at <= latest_created_at
            && match self.removed_at {
                Some(removed) => edited_at > removed,
                None => true,
            }
    }
}

impl SplayValue for TextNode {
    fn len(&self) -> usize {
        if self.removed_at.is_some() {
            0
        } else {
            self.content_len()
        }
    }
}

impl fmt::Display for TextNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.content)
    }
}

/// RGA of splittable text nodes indexed by a splay tree keyed on visible
/// length.
///
/// The list starts at an empty sentinel. An edit splits the boundary nodes,
/// tombstones the covered range and inserts the new content as a node keyed
/// by the edit ticket. Concurrent edits commute because range deletion only
/// touches nodes the editor had observed (tracked per actor) and insertion
/// skips nodes created after the edit.
#[derive(Debug, Clone)]
pub struct RgaTreeSplit {
    tree: SplayTree<TextNode>,
    head: NodeRef,
    by_id: BTreeMap<TextNodeId, NodeRef>,
}

impl RgaTreeSplit {
    pub fn new() -> Self {
        let head_id = TextNodeId::new(Ticket::INITIAL, 0);
        let mut tree = SplayTree::new();
        let head = tree.insert(TextNode::new(head_id, String::new()));
        let mut by_id = BTreeMap::new();
        by_id.insert(head_id, head);
        RgaTreeSplit { tree, head, by_id }
    }

    /// Visible length in characters.
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resolves a character index to a position. A boundary index resolves
    /// to the end of the left-hand node, so insertions anchor after it.
    pub fn find_pos(&mut self, index: usize) -> TextNodePos {
        let (node, offset) = self
            .tree
            .find(index)
            .expect("tree always contains the sentinel");
        TextNodePos::new(self.tree.value(node).id, offset as u32)
    }

    /// Applies an edit: tombstones the covered range and inserts `content`
    /// at the `from` boundary. `latest_by_actor` carries, per actor, the
    /// newest node the editor had observed; `None` means a local edit that
    /// observed everything. Returns the caret position after the edit and
    /// the per-actor maximum created-at actually covered, or `None` when the
    /// boundary nodes are unknown and the edit is dropped.
    pub fn edit(
        &mut self,
        from: TextNodePos,
        to: TextNodePos,
        latest_by_actor: Option<&HashMap<ActorId, Ticket>>,
        content: &str,
        edited_at: Ticket,
    ) -> Option<(TextNodePos, HashMap<ActorId, Ticket>)> {
        if !content.is_empty() && self.by_id.contains_key(&TextNodeId::new(edited_at, 0)) {
            // Replayed edit; its node already exists and its tombstones are
            // monotone, so there is nothing left to apply.
            return None;
        }
        let (_, to_right) = self.find_with_split(to, edited_at)?;
        let (from_left, from_right) = self.find_with_split(from, edited_at)?;

        let candidates = self.nodes_between(from_right, to_right);
        let created_map = self.delete_nodes(&candidates, latest_by_actor, edited_at);

        let caret = if content.is_empty() {
            let left = self.tree.value(from_left);
            TextNodePos::new(left.id, left.content_len() as u32)
        } else {
            let node = TextNode::new(TextNodeId::new(edited_at, 0), content.to_string());
            let caret_offset = node.content_len() as u32;
            let inserted = self.insert_after_node(from_left, node);
            TextNodePos::new(self.tree.value(inserted).id, caret_offset)
        };
        Some((caret, created_map))
    }

    /// Concatenation of the visible nodes.
    pub fn value(&self) -> String {
        let mut out = String::new();
        let mut cur = self.tree.value(self.head).next;
        while let Some(h) = cur {
            let node = self.tree.value(h);
            if node.removed_at.is_none() {
                out.push_str(&node.content);
            }
            cur = node.next;
        }
        out
    }

    /// All nodes in sequence order, tombstones included, sentinel excluded.
    pub fn nodes(&self) -> Vec<&TextNode> {
        let mut out = Vec::new();
        let mut cur = self.tree.value(self.head).next;
        while let Some(h) = cur {
            let node = self.tree.value(h);
            out.push(node);
            cur = node.next;
        }
        out
    }

    /// `[<subtree_weight>,<len>]<content>` rendering of the index tree, for
    /// tests.
    pub fn annotated_string(&self) -> String {
        self.tree.annotated_string()
    }

    /// Appends a node at the end of the sequence, bypassing conflict
    /// resolution. Only used when rebuilding from a snapshot, where nodes
    /// arrive in final order, tombstones included. The tombstone is set
    /// before insertion so the index weight starts out at zero.
    pub(crate) fn append(&mut self, id: TextNodeId, content: String, removed_at: Option<Ticket>) {
        let mut tail = self.head;
        while let Some(next) = self.tree.value(tail).next {
            tail = next;
        }
        let mut node = TextNode::new(id, content);
        node.removed_at = removed_at;
        self.insert_after_node(tail, node);
    }

    fn find_with_split(
        &mut self,
        pos: TextNodePos,
        edited_at: Ticket,
    ) -> Option<(NodeRef, Option<NodeRef>)> {
        let absolute = pos.absolute();
        let node = self.find_floor_prefer_left(absolute)?;
        let relative = (absolute.offset - self.tree.value(node).id.offset) as usize;
        self.split_node(node, relative);

        // Skip nodes created after this edit so concurrent inserts at the
        // same boundary keep their converged order.
        let mut left = node;
        let mut right = self.tree.value(node).next;
        while let Some(r) = right {
            let r_created = self.tree.value(r).id.created_at;
            if r_created <= edited_at {
                break;
            }
            left = r;
            right = self.tree.value(r).next;
        }
        Some((left, right))
    }

    /// Floor lookup by absolute id. When the id lands exactly on the start
    /// of a later split piece the position belongs to the end of its
    /// insertion predecessor.
    fn find_floor_prefer_left(&self, id: TextNodeId) -> Option<NodeRef> {
        let (&found_id, &node) = self.by_id.range(..=id).next_back()?;
        if found_id.created_at != id.created_at {
            return None;
        }
        if id.offset > 0 && id.offset == found_id.offset {
            return self.tree.value(node).ins_prev;
        }
        Some(node)
    }

    /// Ensures a node boundary exists at `offset` characters into `node`.
    fn split_node(&mut self, node: NodeRef, offset: usize) {
        let value = self.tree.value(node);
        let content_len = value.content_len();
        if offset == 0 || offset >= content_len {
            return;
        }

        let byte_offset = value
            .content
            .char_indices()
            .nth(offset)
            .map(|(i, _)| i)
            .expect("offset checked against char count");
        let right_content = value.content[byte_offset..].to_string();
        let right_id = TextNodeId::new(value.id.created_at, value.id.offset + offset as u32);
        let removed_at = value.removed_at;

        self.tree.value_mut(node).content.truncate(byte_offset);
        let mut right = TextNode::new(right_id, right_content);
        right.removed_at = removed_at;
        let right_ref = self.insert_after_node(node, right);

        let ins_next = self.tree.value(node).ins_next;
        self.tree.value_mut(right_ref).ins_prev = Some(node);
        self.tree.value_mut(right_ref).ins_next = ins_next;
        if let Some(n) = ins_next {
            self.tree.value_mut(n).ins_prev = Some(right_ref);
        }
        self.tree.value_mut(node).ins_next = Some(right_ref);
    }

    fn insert_after_node(&mut self, prev: NodeRef, node: TextNode) -> NodeRef {
        let id = node.id;
        let next = self.tree.value(prev).next;
        let handle = self.tree.insert_after(prev, node);
        self.tree.value_mut(handle).prev = Some(prev);
        self.tree.value_mut(handle).next = next;
        self.tree.value_mut(prev).next = Some(handle);
        if let Some(n) = next {
            self.tree.value_mut(n).prev = Some(handle);
        }
        self.by_id.insert(id, handle);
        handle
    }

    fn nodes_between(&self, from: Option<NodeRef>, to: Option<NodeRef>) -> Vec<NodeRef> {
        let mut out = Vec::new();
        let mut cur = from;
        while let Some(h) = cur {
            if Some(h) == to {
                break;
            }
            out.push(h);
            cur = self.tree.value(h).next;
        }
        out
    }

    fn delete_nodes(
        &mut self,
        candidates: &[NodeRef],
        latest_by_actor: Option<&HashMap<ActorId, Ticket>>,
        edited_at: Ticket,
    ) -> HashMap<ActorId, Ticket> {
        let mut created_map: HashMap<ActorId, Ticket> = HashMap::new();
        for &handle in candidates {
            let node = self.tree.value(handle);
            let actor = node.id.created_at.actor();
            let latest_created_at = match latest_by_actor {
                None => Ticket::MAX,
                Some(map) => map.get(&actor).copied().unwrap_or(Ticket::INITIAL),
            };
            if !node.can_delete(edited_at, latest_created_at) {
                continue;
            }
            let created_at = node.id.created_at;
            created_map
                .entry(actor)
                .and_modify(|t| {
                    if created_at > *t {
                        *t = created_at;
                    }
                })
                .or_insert(created_at);
            self.tree.value_mut(handle).removed_at = Some(edited_at);
            // The node's visible length changed; splaying repairs the
            // cached weights along its path.
            self.tree.splay(handle);
        }
        created_map
    }
}

impl Default for RgaTreeSplit {
    fn default() -> Self {
        Self::new()
    }
}
