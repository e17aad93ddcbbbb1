//! Codec trait and implementations for serializing/deserializing messages.
//!
//! The rest of the server never calls `serde_json` directly; it goes
//! through a [`Codec`], so the wire format can change without touching the
//! router or the connection handler.

use serde::{de::DeserializeOwned, Serialize};

use crate::ProtocolError;

/// Encodes Rust values to bytes and decodes bytes back.
///
/// `Send + Sync + 'static` because one codec instance is shared by every
/// connection task for the lifetime of the server.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed,
    /// incomplete, or don't match the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// The browser client speaks JSON natively, so this is the only codec the
/// server ships with. Behind the `json` feature flag (on by default).
///
/// ## Example
///
/// ```rust
/// use noughts_protocol::{Codec, Intent, JsonCodec};
///
/// let codec = JsonCodec;
/// let intent: Intent = codec.decode(br#"{"type":"make-move","position":4}"#).unwrap();
/// assert_eq!(intent, Intent::make_move(4));
///
/// let bytes = codec.encode(&intent).unwrap();
/// let again: Intent = codec.decode(&bytes).unwrap();
/// assert_eq!(intent, again);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
