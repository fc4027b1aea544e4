use chrono::Utc;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub id: i64,
    pub text: String,
    pub sender: Sender,
}

/// Snapshot of the single conversation, published to the presentation
/// layer on every change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationState {
    messages: Vec<Message>,
    pub pending_input: String,
    pub busy: bool,
    /// Reply segments still waiting for their turn in staged delivery.
    pub pending_segments: usize,
}

impl ConversationState {
    /// A conversation that opens with the assistant's greeting.
    pub fn new(greeting: &str) -> Self {
        let mut state = Self::default();
        state.push(Sender::Assistant, greeting);
        state
    }

    /// Whether a new send may start right now.
    pub fn accepts_input(&self) -> bool {
        !self.busy && self.pending_segments == 0
    }

    /// Appends a message stamped with the current time in milliseconds.
    /// Ids stay strictly increasing when several messages land within the
    /// same millisecond.
    pub fn push(&mut self, sender: Sender, text: &str) -> &Message {
        let now = Utc::now().timestamp_millis();
        let id = match self.messages.last() {
            Some(last) if last.id >= now => last.id + 1,
            _ => now,
        };

        self.messages.push(Message {
            id,
            text: text.to_string(),
            sender,
        });
        &self.messages[self.messages.len() - 1]
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_with_greeting() {
        let state = ConversationState::new("Hello there");
        assert_eq!(state.messages().len(), 1);
        assert_eq!(state.messages()[0].sender, Sender::Assistant);
        assert_eq!(state.messages()[0].text, "Hello there");
        assert!(state.accepts_input());
    }

    #[test]
    fn test_ids_unique_within_same_millisecond() {
        let mut state = ConversationState::new("hi");
        for i in 0..50 {
            state.push(Sender::Assistant, &format!("segment {}", i));
        }

        let ids: Vec<i64> = state.messages().iter().map(|m| m.id).collect();
        assert!(ids.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn test_input_gate() {
        let mut state = ConversationState::new("hi");
        state.busy = true;
        assert!(!state.accepts_input());

        state.busy = false;
        state.pending_segments = 2;
        assert!(!state.accepts_input());

        state.pending_segments = 0;
        assert!(state.accepts_input());
    }

    #[test]
    fn test_sender_serializes_lowercase() {
        let json = serde_json::to_string(&Sender::Assistant).unwrap();
        assert_eq!(json, r#""assistant""#);
    }
}
