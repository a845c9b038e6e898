//! Wire codecs: CBOR framing for change packs and the byte-exact snapshot
//! format for persistence.

mod change_pack;
mod snapshot;

pub use change_pack::{decode_change_pack, encode_change_pack};
pub use snapshot::{object_from_bytes, object_to_bytes};
