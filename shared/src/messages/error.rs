use thiserror::Error;

/// Errors that can occur while encoding or decoding a [`NetworkMessage`](crate::NetworkMessage)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessageError {
    /// The message could not be serialized
    #[error("Failed to encode {kind} message: {reason}")]
    Encode { kind: &'static str, reason: String },

    /// The payload is not a well-formed message (SECURITY: potentially malicious payload)
    #[error("Failed to decode message of {payload_size} bytes: {reason}")]
    Decode { payload_size: usize, reason: String },

    /// The payload is well-formed but carries a kind this build does not know
    #[error("Unknown message kind '{kind}'")]
    UnknownKind { kind: String },
}

impl MessageError {
    /// Returns true for malformed payloads, which are dropped without logging
    pub fn is_decode_failure(&self) -> bool {
        matches!(self, MessageError::Decode { .. })
    }
}
