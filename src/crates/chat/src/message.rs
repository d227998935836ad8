//! Chat wire types

use crate::error::{ChatError, Result};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Longest message the server accepts, in characters
pub const MAX_MESSAGE_CHARS: usize = 1024;

/// A chat message. Ordered by the server-assigned `id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub id: i64,
    #[serde(default)]
    pub sender_id: i64,
    #[serde(default)]
    pub sender_name: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub timestamp: String,
}

impl Message {
    /// Decode an inbound live frame. Frames without a positive id are
    /// rejected.
    pub fn parse_frame(text: &str) -> Result<Message> {
        let message: Message = serde_json::from_str(text)
            .map_err(|e| ChatError::Malformed(format!("invalid chat frame: {}", e)))?;
        if !message.has_valid_id() {
            return Err(ChatError::Malformed(format!(
                "chat frame with invalid id {}",
                message.id
            )));
        }
        Ok(message)
    }

    pub fn has_valid_id(&self) -> bool {
        self.id > 0
    }

    /// Server timestamp, when it parses as RFC 3339
    pub fn sent_at(&self) -> Option<DateTime<FixedOffset>> {
        DateTime::parse_from_rfc3339(&self.timestamp).ok()
    }
}

/// Outgoing frame: `{"message": "..."}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OutboundFrame {
    pub message: String,
}

impl OutboundFrame {
    /// Trim and validate user input.
    pub fn new(content: &str) -> Result<Self> {
        let message = content.trim();
        if message.is_empty() {
            return Err(ChatError::InvalidMessage("message is empty".to_string()));
        }
        let chars = message.chars().count();
        if chars > MAX_MESSAGE_CHARS {
            return Err(ChatError::InvalidMessage(format!(
                "message is {} characters long, limit is {}",
                chars, MAX_MESSAGE_CHARS
            )));
        }
        Ok(Self {
            message: message.to_string(),
        })
    }
}

/// One page of `GET messages/`, newest first
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct HistoryPage {
    #[serde(default)]
    pub count: u64,
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    pub results: Vec<Message>,
}

impl HistoryPage {
    pub fn parse(body: &str) -> Result<HistoryPage> {
        serde_json::from_str(body)
            .map_err(|e| ChatError::Malformed(format!("invalid history page: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_frame() {
        let message = Message::parse_frame(
            r#"{"id": 4, "sender_id": 2, "sender_name": "Jan Nowak", "content": "hej", "timestamp": "2024-05-01T10:00:00.123456+00:00"}"#,
        )
        .unwrap();

        assert_eq!(message.id, 4);
        assert_eq!(message.sender_name, "Jan Nowak");
        assert!(message.sent_at().is_some());
    }

    #[test]
    fn test_parse_frame_rejects_bad_ids() {
        assert!(Message::parse_frame("not json").is_err());
        assert!(Message::parse_frame(r#"{"content": "no id"}"#).is_err());
        assert!(Message::parse_frame(r#"{"id": 0, "content": "zero"}"#).is_err());
        assert!(Message::parse_frame(r#"{"id": -3}"#).is_err());
    }

    #[test]
    fn test_outbound_frame_validation() {
        assert_eq!(OutboundFrame::new("  hi  ").unwrap().message, "hi");
        assert!(OutboundFrame::new("   ").is_err());
        assert!(OutboundFrame::new(&"x".repeat(MAX_MESSAGE_CHARS)).is_ok());
        assert!(OutboundFrame::new(&"x".repeat(MAX_MESSAGE_CHARS + 1)).is_err());
        // Counted in characters, not bytes
        assert!(OutboundFrame::new(&"ż".repeat(MAX_MESSAGE_CHARS)).is_ok());
    }

    #[test]
    fn test_outbound_frame_wire_shape() {
        let frame = OutboundFrame::new("hello").unwrap();
        assert_eq!(
            serde_json::to_string(&frame).unwrap(),
            r#"{"message":"hello"}"#
        );
    }

    #[test]
    fn test_history_page() {
        let page = HistoryPage::parse(
            r#"{"count": 3, "next": "http://h/api/messages/?limit=2&offset=2", "previous": null,
                "results": [{"id": 3}, {"id": 2}]}"#,
        )
        .unwrap();
        assert_eq!(page.results.len(), 2);
        assert!(page.next.is_some());

        assert!(HistoryPage::parse(r#"{"detail": "oops"}"#).is_err());
        assert!(HistoryPage::parse(r#"{"next": null, "results": null}"#).is_err());
    }
}
