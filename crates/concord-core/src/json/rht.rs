use std::collections::HashMap;

use crate::time::Ticket;

/// Last-writer-wins hash table mapping keys to the creation ticket of the
/// winning element. Losing elements stay registered in the document root so
/// late operations can still address them; the table only tracks winners.
#[derive(Debug, Clone, Default)]
pub struct Rht {
    entries: HashMap<String, Ticket>,
}

impl Rht {
    pub fn new() -> Self {
        Self::default()
    }

    /// Associates `key` with the element created at `created_at` if it wins
    /// the last-writer race. Returns the displaced winner, if any.
    pub fn set(&mut self, key: &str, created_at: Ticket) -> Option<Ticket> {
        match self.entries.get(key) {
            Some(&current) if created_at <= current => None,
            _ => self.entries.insert(key.to_string(), created_at),
        }
    }

    pub fn get(&self, key: &str) -> Option<Ticket> {
        self.entries.get(key).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Ticket)> {
        self.entries.iter().map(|(k, &t)| (k.as_str(), t))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
