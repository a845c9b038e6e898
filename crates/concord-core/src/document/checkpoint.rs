use std::fmt;

use serde::{Deserialize, Serialize};

/// Progress marker of a replica: the server sequence it has observed and
/// the client sequence the server has acknowledged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    server_seq: u64,
    client_seq: u32,
}

impl Checkpoint {
    pub const INITIAL: Checkpoint = Checkpoint {
        server_seq: 0,
        client_seq: 0,
    };

    pub fn new(server_seq: u64, client_seq: u32) -> Self {
        Checkpoint {
            server_seq,
            client_seq,
        }
    }

    pub fn server_seq(&self) -> u64 {
        self.server_seq
    }

    pub fn client_seq(&self) -> u32 {
        self.client_seq
    }

    /// Element-wise maximum merge; a checkpoint never moves backwards.
    pub fn forward(&self, other: Checkpoint) -> Checkpoint {
        Checkpoint {
            server_seq: self.server_seq.max(other.server_seq),
            client_seq: self.client_seq.max(other.client_seq),
        }
    }
}

impl fmt::Display for Checkpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "serverSeq={}, clientSeq={}", self.server_seq, self.client_seq)
    }
}
