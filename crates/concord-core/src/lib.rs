//! Core of the Concord document replication engine.
//!
//! A JSON-like document is a tree of CRDT elements, every one identified by
//! the Lamport [`time::Ticket`] that created it. Local mutations run
//! through [`document::Document::update`], producing [`document::Change`]s
//! that replicas exchange in [`document::ChangePack`]s; applying the same
//! set of changes in any order consistent with the Lamport partial order
//! yields the same tree on every replica.

pub mod codec;
pub mod document;
mod error;
pub mod json;
pub mod operation;
pub mod time;

pub use error::CoreError;
