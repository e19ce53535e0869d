//! Message codec
//!
//! Marshaling of structured messages to and from payload bytes, used by the
//! typed client operations. Encoding is bincode over serde; failures surface
//! as `Encode`/`Decode` and never disturb CAS state: the version and
//! existence information a caller already obtained stays valid.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{CasKvError, Result};

/// Marshal a message into payload bytes
pub fn encode_message<T: Serialize>(message: &T) -> Result<Vec<u8>> {
    bincode::serialize(message).map_err(|e| CasKvError::Encode(e.to_string()))
}

/// Unmarshal payload bytes into a message
pub fn decode_message<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    bincode::deserialize(bytes).map_err(|e| CasKvError::Decode(e.to_string()))
}
