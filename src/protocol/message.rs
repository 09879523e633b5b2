//! Message envelopes and their JSON encoding

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Error decoding or encoding a message envelope
#[derive(Debug)]
pub enum ProtocolError {
    /// Inbound payload is not a valid envelope
    Decode(serde_json::Error),
    /// Outbound message could not be serialized
    Encode(serde_json::Error),
}

impl std::fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProtocolError::Decode(e) => write!(f, "Malformed message: {}", e),
            ProtocolError::Encode(e) => write!(f, "Failed to encode message: {}", e),
        }
    }
}

impl std::error::Error for ProtocolError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProtocolError::Decode(e) | ProtocolError::Encode(e) => Some(e),
        }
    }
}

/// Message sent by a client
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type")]
pub enum InboundMessage {
    /// Start viewing a box
    #[serde(rename = "join")]
    Join {
        #[serde(rename = "boxId")]
        box_id: String,
    },

    /// Replace the box text with the full new contents
    #[serde(rename = "textUpdate")]
    TextUpdate { text: String },

    /// Any other `type` value
    #[serde(other)]
    Unknown,
}

impl InboundMessage {
    /// Decode a raw frame payload
    pub fn decode(raw: &[u8]) -> Result<Self, ProtocolError> {
        serde_json::from_slice(raw).map_err(ProtocolError::Decode)
    }
}

/// Message sent to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum OutboundMessage {
    /// Presence count of the box
    UserCount { count: usize },

    /// New full text of the box
    TextUpdate { text: String },
}

impl OutboundMessage {
    /// Presence count message
    pub fn user_count(count: usize) -> Self {
        OutboundMessage::UserCount { count }
    }

    /// Serialize to a shareable frame payload
    pub fn encode(&self) -> Result<Bytes, ProtocolError> {
        serde_json::to_vec(self)
            .map(Bytes::from)
            .map_err(ProtocolError::Encode)
    }

    /// Parse an outbound frame (used by clients and tests)
    pub fn decode(raw: &[u8]) -> Result<Self, ProtocolError> {
        serde_json::from_slice(raw).map_err(ProtocolError::Decode)
    }
}

/// Borrowed form of `OutboundMessage::TextUpdate`
#[derive(Serialize)]
#[serde(tag = "type", rename = "textUpdate")]
struct TextUpdateRef<'a> {
    text: &'a str,
}

/// Encode a text update without copying the text into an owned message
pub fn encode_text_update(text: &str) -> Result<Bytes, ProtocolError> {
    serde_json::to_vec(&TextUpdateRef { text })
        .map(Bytes::from)
        .map_err(ProtocolError::Encode)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_join() {
        let msg = InboundMessage::decode(br#"{"type":"join","boxId":"room1"}"#).unwrap();
        assert_eq!(
            msg,
            InboundMessage::Join {
                box_id: "room1".to_string()
            }
        );
    }

    #[test]
    fn test_decode_text_update_with_extra_fields() {
        let msg =
            InboundMessage::decode(br#"{"text":"hi\nthere","type":"textUpdate","cursor":4}"#)
                .unwrap();
        assert_eq!(
            msg,
            InboundMessage::TextUpdate {
                text: "hi\nthere".to_string()
            }
        );
    }

    #[test]
    fn test_decode_unknown_type() {
        let msg = InboundMessage::decode(br#"{"type":"cursorMove","pos":3}"#).unwrap();
        assert_eq!(msg, InboundMessage::Unknown);
    }

    #[test]
    fn test_decode_malformed() {
        assert!(InboundMessage::decode(b"\xff\x00not json").is_err());
        assert!(InboundMessage::decode(b"[1,2,3]").is_err());
        assert!(InboundMessage::decode(br#"{"boxId":"room1"}"#).is_err()); // No type
        assert!(InboundMessage::decode(br#"{"type":"join"}"#).is_err()); // No boxId
        assert!(InboundMessage::decode(br#"{"type":"textUpdate","text":5}"#).is_err());
    }

    #[test]
    fn test_encode_user_count() {
        let bytes = OutboundMessage::user_count(3).encode().unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value, serde_json::json!({"type": "userCount", "count": 3}));
    }

    #[test]
    fn test_encode_text_update_matches_owned_form() {
        let borrowed = encode_text_update("héllo \"quoted\"").unwrap();
        let decoded = OutboundMessage::decode(&borrowed).unwrap();
        assert_eq!(
            decoded,
            OutboundMessage::TextUpdate {
                text: "héllo \"quoted\"".to_string()
            }
        );

        let value: serde_json::Value = serde_json::from_slice(&borrowed).unwrap();
        assert_eq!(value["type"], "textUpdate");
    }
}
