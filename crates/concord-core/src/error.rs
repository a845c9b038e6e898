use thiserror::Error;

use crate::json::ValueType;
use crate::time::ActorIdError;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("corrupt snapshot payload")]
    CorruptSnapshot,
    #[error("unknown element tag: {0}")]
    UnknownTag(u8),
    #[error("invalid primitive payload for {value_type:?}")]
    InvalidPrimitive { value_type: ValueType },
    #[error("unknown value type tag: {0}")]
    UnknownValueType(u8),
    #[error("snapshot root must be an object created at the initial ticket")]
    InvalidSnapshotRoot,
    #[error("element {0} is not registered")]
    MissingElement(crate::time::Ticket),
    #[error("change pack encoding failed: {0}")]
    Encode(String),
    #[error("change pack decoding failed: {0}")]
    Decode(String),
    #[error(transparent)]
    Actor(#[from] ActorIdError),
}
