use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a document: the collection it belongs to and its name
/// within the collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentKey {
    pub collection: String,
    pub document: String,
}

impl DocumentKey {
    pub fn new(collection: &str, document: &str) -> Self {
        DocumentKey {
            collection: collection.to_string(),
            document: document.to_string(),
        }
    }

    /// The combined form used as a storage and lock key.
    pub fn combined(&self) -> String {
        format!("{}${}", self.collection, self.document)
    }
}

impl fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}${}", self.collection, self.document)
    }
}
