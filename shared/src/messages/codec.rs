use serde_json::Value;

use crate::messages::{error::MessageError, message::NetworkMessage};

/// Serialize a message into its wire payload
pub fn encode(message: &NetworkMessage) -> Result<Vec<u8>, MessageError> {
    serde_json::to_vec(message).map_err(|error| MessageError::Encode {
        kind: message.kind(),
        reason: error.to_string(),
    })
}

/// Parse a wire payload. A well-formed payload with an unrecognised `kind`
/// is reported as [`MessageError::UnknownKind`]; anything else that fails is
/// [`MessageError::Decode`].
pub fn decode(payload: &[u8]) -> Result<NetworkMessage, MessageError> {
    let decode_error = |reason: String| MessageError::Decode {
        payload_size: payload.len(),
        reason,
    };

    let value: Value =
        serde_json::from_slice(payload).map_err(|error| decode_error(error.to_string()))?;

    let kind = value
        .get("kind")
        .and_then(Value::as_str)
        .ok_or_else(|| decode_error("missing 'kind' discriminator".to_string()))?;
    if !NetworkMessage::is_known_kind(kind) {
        return Err(MessageError::UnknownKind {
            kind: kind.to_string(),
        });
    }

    serde_json::from_value(value).map_err(|error| decode_error(error.to_string()))
}
