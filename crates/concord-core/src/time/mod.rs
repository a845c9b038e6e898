//! Logical time: actor identifiers and Lamport tickets.

mod actor;
mod ticket;

pub use actor::{ActorId, ActorIdError, ACTOR_ID_SIZE};
pub use ticket::Ticket;
