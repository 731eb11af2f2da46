use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One entry of the conversation. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// A send attempted while the socket was not open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSend {
    pub user_message_content: String,
    // Snapshot of the transcript at send time (including the user message itself).
    pub conversation_history: Vec<ChatMessage>,
}

impl PendingSend {
    pub fn new(user_message_content: impl Into<String>, history: Vec<ChatMessage>) -> Self {
        Self {
            user_message_content: user_message_content.into(),
            conversation_history: history,
        }
    }
}

/// Inbound events of a chat socket, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketEvent {
    Frame(String),
    Error(String),
    Closed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_serializes_lowercase() {
        let json = serde_json::to_string(&ChatMessage::assistant("hi")).unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"hi"}"#);

        let back: ChatMessage = serde_json::from_str(r#"{"role":"user","content":"x"}"#).unwrap();
        assert_eq!(back, ChatMessage::user("x"));
    }
}
