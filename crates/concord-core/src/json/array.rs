use crate::time::Ticket;

use super::rga::Rga;
use super::root::Root;

/// JSON array element backed by the RGA sequence.
#[derive(Debug, Clone)]
pub struct Array {
    elements: Rga,
    created_at: Ticket,
    deleted_at: Option<Ticket>,
}

impl Array {
    pub fn new(created_at: Ticket) -> Self {
        Array {
            elements: Rga::new(),
            created_at,
            deleted_at: None,
        }
    }

    pub fn add(&mut self, created_at: Ticket) {
        self.elements.add(created_at);
    }

    pub fn insert_after(&mut self, prev_created_at: Ticket, created_at: Ticket) -> bool {
        self.elements.insert_after(prev_created_at, created_at)
    }

    pub fn remove_by_created_at(
        &mut self,
        created_at: Ticket,
        deleted_at: Ticket,
    ) -> Option<bool> {
        self.elements.remove_by_created_at(created_at, deleted_at)
    }

    pub fn get(&self, idx: usize) -> Option<Ticket> {
        self.elements.get(idx)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn last_created_at(&self) -> Ticket {
        self.elements.last_created_at()
    }

    /// Sequence nodes in order, tombstones included.
    pub fn nodes(&self) -> Vec<(Ticket, Option<Ticket>)> {
        self.elements.nodes()
    }

    pub fn iter_visible(&self) -> impl Iterator<Item = Ticket> + '_ {
        self.elements.iter_visible()
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

    /// JSON encoding of the visible elements, comma separated.
    pub fn marshal(&self, root: &Root) -> String {
        let mut out = String::from("[");
        for (i, ticket) in self.elements.iter_visible().enumerate() {
            if i > 0 {
                out.push(',');
            }
            match root.element(ticket) {
                Some(elem) => out.push_str(&elem.marshal(root)),
                None => out.push_str("null"),
            }
        }
        out.push(']');
        out
    }
}
