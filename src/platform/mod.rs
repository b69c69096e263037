pub mod groupme;

use serde_json::Value;

/// Sender name used when the payload carries none.
pub const DEFAULT_SENDER_NAME: &str = "there";

/// A message received from the chat platform's webhook.
/// Built per request and dropped once the reply is computed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Origin classification: "user", "bot" or "system"
    pub sender_type: String,
    /// Display name of the sender, trimmed
    pub sender_name: String,
    /// The message text, trimmed
    pub text: String,
}

impl Default for InboundMessage {
    fn default() -> Self {
        Self {
            sender_type: String::new(),
            sender_name: DEFAULT_SENDER_NAME.to_string(),
            text: String::new(),
        }
    }
}

impl InboundMessage {
    pub fn new(sender_type: &str, sender_name: &str, text: &str) -> Self {
        let sender_name = match sender_name.trim() {
            "" => DEFAULT_SENDER_NAME.to_string(),
            name => name.to_string(),
        };
        Self {
            sender_type: sender_type.to_string(),
            sender_name,
            text: text.trim().to_string(),
        }
    }

    /// Extract the fields we care about from a webhook payload.
    /// Missing or non-string fields take their defaults; everything else is ignored.
    pub fn from_payload(payload: &Value) -> Self {
        Self::new(
            str_field(payload, "sender_type"),
            str_field(payload, "name"),
            str_field(payload, "text"),
        )
    }

    /// Parse a raw request body. Malformed JSON is treated as an empty payload.
    pub fn from_body(body: &[u8]) -> Self {
        match serde_json::from_slice::<Value>(body) {
            Ok(payload) => Self::from_payload(&payload),
            Err(e) => {
                tracing::debug!("Ignoring malformed webhook payload: {}", e);
                Self::default()
            }
        }
    }

    pub fn is_from_user(&self) -> bool {
        self.sender_type == "user"
    }
}

fn str_field<'a>(payload: &'a Value, key: &str) -> &'a str {
    payload.get(key).and_then(Value::as_str).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_payload_reads_fields() {
        let msg = InboundMessage::from_payload(&json!({
            "sender_type": "user",
            "name": "  Alberto ",
            "text": "  joke please  ",
            "group_id": "123",
            "attachments": []
        }));
        assert_eq!(msg.sender_type, "user");
        assert_eq!(msg.sender_name, "Alberto");
        assert_eq!(msg.text, "joke please");
        assert!(msg.is_from_user());
    }

    #[test]
    fn test_missing_name_defaults_to_there() {
        let msg = InboundMessage::from_payload(&json!({"sender_type": "user", "text": "hi"}));
        assert_eq!(msg.sender_name, "there");
    }

    #[test]
    fn test_non_string_fields_take_defaults() {
        let msg = InboundMessage::from_payload(&json!({
            "sender_type": 7,
            "name": null,
            "text": ["joke"]
        }));
        assert_eq!(msg, InboundMessage::default());
        assert!(!msg.is_from_user());
    }

    #[test]
    fn test_malformed_body_is_empty_payload() {
        let msg = InboundMessage::from_body(b"{not json");
        assert_eq!(msg, InboundMessage::default());
    }

    #[test]
    fn test_non_object_body_is_empty_payload() {
        let msg = InboundMessage::from_body(b"[1, 2, 3]");
        assert_eq!(msg, InboundMessage::default());
    }

    #[test]
    fn test_bot_sender_is_not_user() {
        let msg =
            InboundMessage::from_body(br#"{"sender_type":"bot","name":"jokebot","text":"joke"}"#);
        assert!(!msg.is_from_user());
    }
}
