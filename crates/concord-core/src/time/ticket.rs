use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::ActorId;

/// Lamport timestamp identifying a CRDT node or an operation.
///
/// The total order compares `lamport`, then `actor`, then `delimiter`; every
/// ticket issued in the system is unique under it because an actor never
/// reuses a `(lamport, delimiter)` pair.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ticket {
    lamport: u64,
    delimiter: u32,
    #[serde(rename = "actor_id_hex")]
    actor: ActorId,
}

impl Ticket {
    /// Ticket of the document root; smaller than every issued ticket.
    pub const INITIAL: Ticket = Ticket {
        lamport: 0,
        delimiter: 0,
        actor: ActorId::INITIAL,
    };

    /// Upper bound of the ticket order; never issued.
    pub const MAX: Ticket = Ticket {
        lamport: u64::MAX,
        delimiter: u32::MAX,
        actor: ActorId::MAX,
    };

    pub fn new(lamport: u64, delimiter: u32, actor: ActorId) -> Self {
        Ticket {
            lamport,
            delimiter,
            actor,
        }
    }

    pub fn lamport(&self) -> u64 {
        self.lamport
    }

    pub fn delimiter(&self) -> u32 {
        self.delimiter
    }

    pub fn actor(&self) -> ActorId {
        self.actor
    }

    /// A ticket causally after both `self` and `other`, keeping this
    /// ticket's actor. The delimiter restarts at zero; per-operation
    /// delimiters are handed out by the change context.
    pub fn after(&self, other: Ticket) -> Ticket {
        Ticket {
            lamport: self.lamport.max(other.lamport) + 1,
            delimiter: 0,
            actor: self.actor,
        }
    }
}

impl Ord for Ticket {
    fn cmp(&self, other: &Self) -> Ordering {
        self.lamport
            .cmp(&other.lamport)
            .then_with(|| self.actor.cmp(&other.actor))
            .then_with(|| self.delimiter.cmp(&other.delimiter))
    }
}

impl PartialOrd for Ticket {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.lamport, self.delimiter, self.actor)
    }
}

impl fmt::Debug for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ticket({self})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(last: u8) -> ActorId {
        let mut bytes = [0u8; 12];
        bytes[11] = last;
        ActorId::from_bytes(bytes)
    }

    #[test]
    fn order_is_lamport_then_actor_then_delimiter() {
        let a = Ticket::new(1, 9, actor(1));
        let b = Ticket::new(2, 0, actor(0));
        assert!(a < b);

        let c = Ticket::new(2, 0, actor(1));
        let d = Ticket::new(2, 0, actor(2));
        assert!(c < d);

        let e = Ticket::new(2, 1, actor(2));
        assert!(d < e);
    }

    #[test]
    fn initial_and_max_bound_every_ticket() {
        let t = Ticket::new(5, 3, actor(7));
        assert!(Ticket::INITIAL < t);
        assert!(t < Ticket::MAX);
    }

    #[test]
    fn after_advances_past_both_clocks() {
        let local = Ticket::new(3, 2, actor(1));
        let remote = Ticket::new(7, 0, actor(2));
        let next = local.after(remote);
        assert_eq!(next.lamport(), 8);
        assert_eq!(next.delimiter(), 0);
        assert_eq!(next.actor(), actor(1));
        assert!(next > local && next > remote);
    }
}
