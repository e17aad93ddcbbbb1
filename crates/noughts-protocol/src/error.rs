//! Error types for the protocol layer.
//!
//! Each crate in Noughts defines its own error enum. A `ProtocolError`
//! always means the problem is in turning frames into messages (or back),
//! never in networking or session rules.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed: malformed JSON, an unknown `type` tag,
    /// missing fields or wrong field types.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The message parsed but its shape is still unusable, e.g. a move
    /// that names neither a position nor a row/column pair.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
}
