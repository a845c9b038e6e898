use serde::{Deserialize, Serialize};

use crate::time::{ActorId, Ticket};

/// Identifier of a change: the actor's own sequence, the server-assigned
/// sequence (zero until assigned), and the Lamport clock at commit time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeId {
    client_seq: u32,
    server_seq: u64,
    lamport: u64,
    actor: ActorId,
}

impl ChangeId {
    pub fn initial(actor: ActorId) -> Self {
        ChangeId {
            client_seq: 0,
            server_seq: 0,
            lamport: 0,
            actor,
        }
    }

    pub fn new(client_seq: u32, lamport: u64, actor: ActorId) -> Self {
        ChangeId {
            client_seq,
            server_seq: 0,
            lamport,
            actor,
        }
    }

    pub fn client_seq(&self) -> u32 {
        self.client_seq
    }

    pub fn server_seq(&self) -> u64 {
        self.server_seq
    }

    pub fn lamport(&self) -> u64 {
        self.lamport
    }

    pub fn actor(&self) -> ActorId {
        self.actor
    }

    /// Identifier for the next local change.
    pub fn next(&self) -> ChangeId {
        ChangeId {
            client_seq: self.client_seq + 1,
            server_seq: 0,
            lamport: self.lamport + 1,
            actor: self.actor,
        }
    }

    /// Advances the Lamport clock past an observed remote clock.
    pub fn sync_lamport(&self, other_lamport: u64) -> ChangeId {
        ChangeId {
            lamport: self.lamport.max(other_lamport) + 1,
            ..*self
        }
    }

    pub fn with_server_seq(&self, server_seq: u64) -> ChangeId {
        ChangeId {
            server_seq,
            ..*self
        }
    }

    pub fn with_actor(&self, actor: ActorId) -> ChangeId {
        ChangeId { actor, ..*self }
    }

    /// Ticket of the change itself; per-operation tickets add a delimiter.
    pub fn ticket(&self, delimiter: u32) -> Ticket {
        Ticket::new(self.lamport, delimiter, self.actor)
    }
}
