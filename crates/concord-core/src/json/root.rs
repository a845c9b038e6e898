use std::collections::HashMap;

use crate::time::Ticket;

use super::element::Element;
use super::object::Object;

/// Owner of every element in a document, keyed by creation ticket.
///
/// The registry is the sole strong owner of elements; containers reference
/// their members by ticket, so there are no ownership cycles and operations
/// locate their targets with a single lookup. Elements stay registered
/// after deletion or displacement; a snapshot carries tombstoned members
/// along (changes sequenced after it may still anchor on them) and drops
/// only what the root no longer reaches.
#[derive(Debug, Clone)]
pub struct Root {
    nodes: HashMap<Ticket, Element>,
}

impl Root {
    pub fn new() -> Self {
        let mut nodes = HashMap::new();
        nodes.insert(
            Ticket::INITIAL,
            Element::Object(Object::new(Ticket::INITIAL)),
        );
        Root { nodes }
    }

    pub(crate) fn empty() -> Self {
        Root {
            nodes: HashMap::new(),
        }
    }

    pub fn element(&self, created_at: Ticket) -> Option<&Element> {
        self.nodes.get(&created_at)
    }

    pub fn element_mut(&mut self, created_at: Ticket) -> Option<&mut Element> {
        self.nodes.get_mut(&created_at)
    }

    /// Registers a freshly created element under its creation ticket. A
    /// ticket already present identifies the same element (tickets are
    /// unique), so replays keep the registered one and its content.
    pub fn register(&mut self, element: Element) {
        self.nodes.entry(element.created_at()).or_insert(element);
    }

    pub fn root_object(&self) -> &Object {
        match self.nodes.get(&Ticket::INITIAL) {
            Some(Element::Object(obj)) => obj,
            _ => unreachable!("the root object is registered at construction"),
        }
    }

    /// Tombstones the element created at `created_at`; unknown targets are
    /// ignored so replays stay idempotent. Returns whether anything changed.
    pub fn delete_element(&mut self, created_at: Ticket, deleted_at: Ticket) -> bool {
        match self.nodes.get_mut(&created_at) {
            Some(elem) => elem.delete(deleted_at),
            None => false,
        }
    }

    /// Number of registered elements, tombstones and displaced values
    /// included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Tickets of all elements reachable from the root through container
    /// links, depth first, tombstoned sequence entries included.
    pub fn descendants(&self) -> Vec<Ticket> {
        let mut out = Vec::new();
        self.collect_descendants(Ticket::INITIAL, &mut out);
        out
    }

    fn collect_descendants(&self, created_at: Ticket, out: &mut Vec<Ticket>) {
        let Some(elem) = self.nodes.get(&created_at) else {
            return;
        };
        match elem {
            Element::Object(obj) => {
                for (_, child) in obj.iter() {
                    out.push(child);
                    self.collect_descendants(child, out);
                }
            }
            Element::Array(arr) => {
                for (child, _) in arr.nodes() {
                    out.push(child);
                    self.collect_descendants(child, out);
                }
            }
            Element::Text(_) | Element::Primitive(_) => {}
        }
    }

    /// JSON encoding of the observable tree.
    pub fn marshal(&self) -> String {
        self.root_object().marshal(self)
    }
}

impl Default for Root {
    fn default() -> Self {
        Self::new()
    }
}
