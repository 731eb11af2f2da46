use crate::types::ChatMessage;
use serde::{Deserialize, Serialize};

/// Ordered conversation. Position is the only correlation between a user message and the
/// assistant reply that follows it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, msg: ChatMessage) {
        self.messages.push(msg);
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn to_vec(&self) -> Vec<ChatMessage> {
        self.messages.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_insertion_order_and_duplicates() {
        let mut t = Transcript::new();
        t.push(ChatMessage::user("hello"));
        t.push(ChatMessage::assistant("hi there"));
        t.push(ChatMessage::user("hello"));

        assert_eq!(t.len(), 3);
        assert_eq!(t.messages()[1], ChatMessage::assistant("hi there"));
        assert_eq!(t.messages()[2], ChatMessage::user("hello"));

        t.clear();
        assert!(t.is_empty());
    }

    #[test]
    fn serializes_as_plain_array() {
        let mut t = Transcript::new();
        t.push(ChatMessage::user("a"));
        assert_eq!(
            serde_json::to_string(&t).unwrap(),
            r#"[{"role":"user","content":"a"}]"#
        );
    }
}
