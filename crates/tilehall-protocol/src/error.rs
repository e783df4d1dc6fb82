//! Error types for the protocol layer.
//!
//! Everything that can go wrong while turning bytes into typed events
//! (or back) ends up here, so the gateway can treat a bad frame as one
//! error kind regardless of where decoding failed.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning an event into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed: malformed JSON, an unknown `type` tag,
    /// missing fields, or a field of the wrong shape.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// A tile code that names no face (e.g. `"0t"` or `"blue"`).
    #[error("invalid tile code: {0:?}")]
    InvalidTile(String),
}
