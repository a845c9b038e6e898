use std::fmt;

use rand::RngCore;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Size of an actor identifier in bytes.
pub const ACTOR_ID_SIZE: usize = 12;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ActorIdError {
    #[error("actor id must be {} hex characters, got {0}", ACTOR_ID_SIZE * 2)]
    InvalidLength(usize),
    #[error("invalid hex digit {0:?} in actor id")]
    InvalidDigit(char),
}

/// Identifier of a client replica. Opaque 12 bytes, rendered as a 24-hex
/// string on the wire. Byte-lexicographic order equals hex-string order,
/// which is what ticket tie-breaking relies on.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ActorId([u8; ACTOR_ID_SIZE]);

impl ActorId {
    /// The all-zero actor, used by the initial ticket.
    pub const INITIAL: ActorId = ActorId([0; ACTOR_ID_SIZE]);
    /// The all-ones actor, used by the maximum ticket.
    pub const MAX: ActorId = ActorId([0xff; ACTOR_ID_SIZE]);

    pub fn random() -> Self {
        let mut bytes = [0u8; ACTOR_ID_SIZE];
        rand::thread_rng().fill_bytes(&mut bytes);
        ActorId(bytes)
    }

    pub fn from_bytes(bytes: [u8; ACTOR_ID_SIZE]) -> Self {
        ActorId(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; ACTOR_ID_SIZE] {
        &self.0
    }

    pub fn from_hex(s: &str) -> Result<Self, ActorIdError> {
        if s.len() != ACTOR_ID_SIZE * 2 {
            return Err(ActorIdError::InvalidLength(s.len()));
        }
        let mut bytes = [0u8; ACTOR_ID_SIZE];
        for (i, chunk) in s.as_bytes().chunks(2).enumerate() {
            let hi = hex_digit(chunk[0] as char)?;
            let lo = hex_digit(chunk[1] as char)?;
            bytes[i] = (hi << 4) | lo;
        }
        Ok(ActorId(bytes))
    }
}

fn hex_digit(c: char) -> Result<u8, ActorIdError> {
    c.to_digit(16).map(|d| d as u8).ok_or(ActorIdError::InvalidDigit(c))
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.0 {
            write!(f, "{b:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ActorId({self})")
    }
}

impl Serialize for ActorId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ActorId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        ActorId::from_hex(&s).map_err(D::Error::custom)
    }
}
