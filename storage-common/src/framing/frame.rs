//! Raw frame representation

use super::message_id::MessageId;
use super::{DELIMITER, MAGIC, TERMINATOR};

/// A complete frame with its JSON payload still unparsed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    pub message_id: MessageId,
    pub message_type: String,
    pub payload: Vec<u8>,
}

impl RawFrame {
    pub fn new(message_id: MessageId, message_type: String, payload: Vec<u8>) -> Self {
        Self {
            message_id,
            message_type,
            payload,
        }
    }

    /// Serialize the frame to its wire representation
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let type_len = self.message_type.len().to_string();
        let payload_len = self.payload.len().to_string();
        let mut out = Vec::with_capacity(
            MAGIC.len()
                + type_len.len()
                + self.message_type.len()
                + payload_len.len()
                + self.payload.len()
                + 24,
        );
        out.extend_from_slice(MAGIC);
        out.extend_from_slice(type_len.as_bytes());
        out.push(DELIMITER);
        out.extend_from_slice(self.message_type.as_bytes());
        out.push(DELIMITER);
        out.extend_from_slice(self.message_id.as_bytes());
        out.push(DELIMITER);
        out.extend_from_slice(payload_len.as_bytes());
        out.push(DELIMITER);
        out.extend_from_slice(&self.payload);
        out.push(TERMINATOR);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_bytes_layout() {
        let id = MessageId::from_bytes(b"a1b2c3d4e5f6").unwrap();
        let frame = RawFrame::new(id, "Roots".to_string(), b"{}".to_vec());
        assert_eq!(frame.to_bytes(), b"SP|5|Roots|a1b2c3d4e5f6|2|{}\n".to_vec());
    }

    #[test]
    fn test_to_bytes_empty_payload() {
        let id = MessageId::from_bytes(b"000000000000").unwrap();
        let frame = RawFrame::new(id, "Roots".to_string(), Vec::new());
        assert!(frame.to_bytes().ends_with(b"|0|\n"));
    }
}
