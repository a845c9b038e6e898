use crate::time::Ticket;

use super::rht::Rht;
use super::root::Root;

/// JSON object element backed by a last-writer-wins hash table.
#[derive(Debug, Clone)]
pub struct Object {
    rht: Rht,
    created_at: Ticket,
    deleted_at: Option<Ticket>,
}

impl Object {
    pub fn new(created_at: Ticket) -> Self {
        Object {
            rht: Rht::new(),
            created_at,
            deleted_at: None,
        }
    }

    /// Associates `key` with the element created at `value_created_at` under
    /// last-writer-wins. Returns the displaced winner, if any; the displaced
    /// element stays in the document registry until a snapshot compacts it.
    pub fn set(&mut self, key: &str, value_created_at: Ticket) -> Option<Ticket> {
        self.rht.set(key, value_created_at)
    }

    /// Creation ticket of the current winner for `key`.
    pub fn get(&self, key: &str) -> Option<Ticket> {
        self.rht.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Ticket)> {
        self.rht.iter()
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

    /// JSON encoding of the observable members, keys sorted for a
    /// deterministic rendering.
    pub fn marshal(&self, root: &Root) -> String {
        let mut entries: Vec<(&str, Ticket)> = self
            .rht
            .iter()
            .filter(|(_, ticket)| {
                root.element(*ticket)
                    .is_some_and(|elem| elem.deleted_at().is_none())
            })
            .collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));

        let mut out = String::from("{");
        for (i, (key, ticket)) in entries.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            let elem = root.element(*ticket).expect("filtered to present elements");
            out.push_str(&serde_json::json!(key).to_string());
            out.push(':');
            out.push_str(&elem.marshal(root));
        }
        out.push('}');
        out
    }
}
