use crate::types::ChatMessage;
use serde::{Deserialize, Serialize};

pub const CHAT_REQUEST_TYPE: &str = "chat_request";

/// Client -> server frame. The whole history is resent with every message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "userMessages")]
    pub user_messages: String,
    pub messages: Vec<ChatMessage>,
}

#[derive(Serialize)]
struct ChatRequestRef<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    #[serde(rename = "userMessages")]
    user_messages: &'a str,
    messages: &'a [ChatMessage],
}

pub fn encode_chat_request(text: &str, history: &[ChatMessage]) -> serde_json::Result<String> {
    serde_json::to_string(&ChatRequestRef {
        kind: CHAT_REQUEST_TYPE,
        user_messages: text,
        messages: history,
    })
}

pub fn decode_chat_request(frame: &str) -> serde_json::Result<ChatRequest> {
    serde_json::from_str(frame)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_envelope_field_names() {
        let frame = encode_chat_request("hello", &[ChatMessage::user("hello")]).unwrap();
        let expected = concat!(
            r#"{"type":"chat_request","userMessages":"hello","#,
            r#""messages":[{"role":"user","content":"hello"}]}"#
        );
        assert_eq!(frame, expected);
    }

    #[test]
    fn decodes_what_it_encodes() {
        let history = vec![ChatMessage::user("a"), ChatMessage::assistant("b")];
        let frame = encode_chat_request("c", &history).unwrap();
        let req = decode_chat_request(&frame).unwrap();
        assert_eq!(req.kind, CHAT_REQUEST_TYPE);
        assert_eq!(req.user_messages, "c");
        assert_eq!(req.messages, history);
    }
}
