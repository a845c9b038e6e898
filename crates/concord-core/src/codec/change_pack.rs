use crate::document::ChangePack;
use crate::error::CoreError;

/// Encodes a change pack for transport as CBOR.
pub fn encode_change_pack(pack: &ChangePack) -> Result<Vec<u8>, CoreError> {
    let mut out = Vec::new();
    ciborium::ser::into_writer(pack, &mut out).map_err(|e| CoreError::Encode(e.to_string()))?;
    Ok(out)
}

/// Decodes a change pack received from transport.
pub fn decode_change_pack(data: &[u8]) -> Result<ChangePack, CoreError> {
    ciborium::de::from_reader(data).map_err(|e| CoreError::Decode(e.to_string()))
}
