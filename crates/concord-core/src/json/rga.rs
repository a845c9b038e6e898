use std::collections::HashMap;

use crate::time::Ticket;

#[derive(Debug, Clone)]
struct RgaNode {
    created_at: Ticket,
    removed_at: Option<Ticket>,
    prev: Option<usize>,
    next: Option<usize>,
}

/// Replicated Growable Array over element tickets.
///
/// An insertion-ordered doubly-linked list headed by a sentinel. Concurrent
/// inserts after the same anchor converge by scanning right past every node
/// whose ticket is strictly larger than the inserted one, so equal-anchor
/// siblings end up ordered by descending ticket on every replica.
#[derive(Debug, Clone)]
pub struct Rga {
    nodes: Vec<RgaNode>,
    index: HashMap<Ticket, usize>,
    tail: usize,
}

impl Rga {
    pub fn new() -> Self {
        let head = RgaNode {
            created_at: Ticket::INITIAL,
            removed_at: None,
            prev: None,
            next: None,
        };
        let mut index = HashMap::new();
        index.insert(Ticket::INITIAL, 0);
        Rga {
            nodes: vec![head],
            index,
            tail: 0,
        }
    }

    /// Appends an element at the end of the sequence.
    pub fn add(&mut self, created_at: Ticket) {
        let tail = self.tail;
        self.link_after(tail, created_at);
    }

    /// Inserts `created_at` after the node identified by `prev_created_at`,
    /// applying the concurrent-insert tie-break. Returns false when the
    /// anchor is unknown, in which case the caller drops the operation.
    pub fn insert_after(&mut self, prev_created_at: Ticket, created_at: Ticket) -> bool {
        if self.index.contains_key(&created_at) {
            // Replayed insert; the node is already placed.
            return true;
        }
        let Some(&anchor) = self.index.get(&prev_created_at) else {
            return false;
        };
        let mut pos = anchor;
        while let Some(next) = self.nodes[pos].next {
            if self.nodes[next].created_at <= created_at {
                break;
            }
            pos = next;
        }
        self.link_after(pos, created_at);
        true
    }

    /// Tombstones the node created at `created_at`. The tombstone ticket is
    /// monotone: a replayed or earlier removal is a no-op. Returns whether
    /// the tombstone changed, or `None` when the target is unknown.
    pub fn remove_by_created_at(
        &mut self,
        created_at: Ticket,
        deleted_at: Ticket,
    ) -> Option<bool> {
        let &slot = self.index.get(&created_at)?;
        if slot == 0 {
            return None;
        }
        let node = &mut self.nodes[slot];
        match node.removed_at {
            Some(current) if deleted_at <= current => Some(false),
            _ => {
                node.removed_at = Some(deleted_at);
                Some(true)
            }
        }
    }

    /// Ticket of the `idx`-th visible element.
    pub fn get(&self, idx: usize) -> Option<Ticket> {
        self.iter_visible().nth(idx)
    }

    /// Number of visible elements.
    pub fn len(&self) -> usize {
        self.iter_visible().count()
    }

    pub fn is_empty(&self) -> bool {
        self.iter_visible().next().is_none()
    }

    /// Ticket of the last visible node, or the sentinel's initial ticket
    /// when the sequence is empty. Used as the anchor for local appends.
    pub fn last_created_at(&self) -> Ticket {
        let mut pos = self.tail;
        loop {
            if pos == 0 {
                return Ticket::INITIAL;
            }
            if self.nodes[pos].removed_at.is_none() {
                return self.nodes[pos].created_at;
            }
            pos = self.nodes[pos].prev.expect("non-head node has a prev");
        }
    }

    /// All nodes in sequence order, tombstones included.
    pub fn nodes(&self) -> Vec<(Ticket, Option<Ticket>)> {
        let mut out = Vec::new();
        let mut cur = self.nodes[0].next;
        while let Some(slot) = cur {
            let node = &self.nodes[slot];
            out.push((node.created_at, node.removed_at));
            cur = node.next;
        }
        out
    }

    pub fn iter_visible(&self) -> impl Iterator<Item = Ticket> + '_ {
        let mut cur = self.nodes[0].next;
        std::iter::from_fn(move || {
            while let Some(slot) = cur {
                let node = &self.nodes[slot];
                cur = node.next;
                if node.removed_at.is_none() {
                    return Some(node.created_at);
                }
            }
            None
        })
    }

    fn link_after(&mut self, pos: usize, created_at: Ticket) {
        let next = self.nodes[pos].next;
        let slot = self.nodes.len();
        self.nodes.push(RgaNode {
            created_at,
            removed_at: None,
            prev: Some(pos),
            next,
        });
        self.nodes[pos].next = Some(slot);
        match next {
            Some(n) => self.nodes[n].prev = Some(slot),
            None => self.tail = slot,
        }
        self.index.insert(created_at, slot);
    }
}

impl Default for Rga {
    fn default() -> Self {
        Self::new()
    }
}
