//! The conversation transcript and its message types.
//!
//! A transcript is an append-only sequence of messages alternating between
//! the user and the assistant. Order is append-order and is the sole
//! ordering guarantee. A turn appends a user message and its paired
//! assistant message together; the assistant message starts empty and is
//! the only message eligible for mutation while the turn is open.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Role of a message in the transcript.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// User role.
    User,

    /// Assistant role.
    Assistant,
}

/// A single message exchanged between the user and the assistant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    /// The role of the message.
    pub role: Role,

    /// The text content of the message.
    pub content: String,
}

impl Message {
    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// An ordered, append-only sequence of messages.
///
/// The transcript is owned by the chat session, lives in memory only, and
/// alternates `user, assistant, user, assistant, ...` from index 0. Turns
/// are appended as pairs via [`begin_turn`](Transcript::begin_turn); the
/// open assistant message is then filled incrementally
/// ([`append_to_reply`](Transcript::append_to_reply)) or all at once
/// ([`set_reply`](Transcript::set_reply)).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    /// Creates an empty transcript.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a transcript from a list of messages, checking the
    /// alternation invariant.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the messages do not alternate
    /// `user, assistant, ...` from index 0, or if a trailing user message
    /// has no paired assistant reply.
    pub fn from_messages(messages: Vec<Message>) -> Result<Self> {
        for (index, message) in messages.iter().enumerate() {
            let expected = if index % 2 == 0 {
                Role::User
            } else {
                Role::Assistant
            };
            if message.role != expected {
                return Err(Error::validation(
                    format!("message at index {index} breaks user/assistant alternation"),
                    Some("messages".to_string()),
                ));
            }
        }
        if messages.len() % 2 != 0 {
            return Err(Error::validation(
                "trailing user message has no paired assistant reply",
                Some("messages".to_string()),
            ));
        }
        Ok(Self { messages })
    }

    /// Appends a user message and its paired, empty assistant message.
    pub fn begin_turn(&mut self, text: impl Into<String>) {
        self.messages.push(Message::user(text));
        self.messages.push(Message::assistant(""));
    }

    /// Extends the open assistant message with a decoded fragment and
    /// returns its full accumulated content.
    ///
    /// The content string is the accumulator: after each fragment the
    /// message holds the concatenation of everything received so far. If
    /// no turn is open this is a no-op that returns the empty string.
    pub fn append_to_reply(&mut self, fragment: &str) -> &str {
        match self.messages.last_mut() {
            Some(message) if message.role == Role::Assistant => {
                message.content.push_str(fragment);
                &message.content
            }
            _ => "",
        }
    }

    /// Sets the open assistant message's content in one mutation.
    ///
    /// If no turn is open this is a no-op.
    pub fn set_reply(&mut self, text: impl Into<String>) {
        if let Some(message) = self.messages.last_mut()
            && message.role == Role::Assistant
        {
            message.content = text.into();
        }
    }

    /// Returns the messages in append order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Returns the last message, if any.
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Returns the number of messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns true if the transcript has no messages.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Discards all messages.
    pub fn clear(&mut self) {
        self.messages.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, to_value};

    #[test]
    fn begin_turn_appends_pair() {
        let mut transcript = Transcript::new();
        transcript.begin_turn("hi there");

        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript.messages()[0], Message::user("hi there"));
        assert_eq!(transcript.messages()[1], Message::assistant(""));
    }

    #[test]
    fn roles_alternate_across_turns() {
        let mut transcript = Transcript::new();
        for turn in 0..4 {
            transcript.begin_turn(format!("question {turn}"));
            transcript.set_reply(format!("answer {turn}"));
        }

        for (index, message) in transcript.messages().iter().enumerate() {
            let expected = if index % 2 == 0 {
                Role::User
            } else {
                Role::Assistant
            };
            assert_eq!(message.role, expected, "index {index}");
        }
    }

    #[test]
    fn append_passes_through_cumulative_values() {
        let mut transcript = Transcript::new();
        transcript.begin_turn("greet me");

        assert_eq!(transcript.append_to_reply("He"), "He");
        assert_eq!(transcript.append_to_reply("llo"), "Hello");
        assert_eq!(transcript.last().unwrap().content, "Hello");
    }

    #[test]
    fn append_is_granularity_independent() {
        let mut coarse = Transcript::new();
        coarse.begin_turn("greet me");
        coarse.append_to_reply("He");
        coarse.append_to_reply("llo");

        let mut fine = Transcript::new();
        fine.begin_turn("greet me");
        for fragment in ["H", "e", "l", "l", "o"] {
            fine.append_to_reply(fragment);
        }

        assert_eq!(coarse, fine);
    }

    #[test]
    fn set_reply_is_atomic() {
        let mut transcript = Transcript::new();
        transcript.begin_turn("greet me");
        transcript.set_reply("hello");

        assert_eq!(transcript.last().unwrap(), &Message::assistant("hello"));
    }

    #[test]
    fn mutation_without_open_turn_is_a_no_op() {
        let mut transcript = Transcript::new();
        assert_eq!(transcript.append_to_reply("stray"), "");
        transcript.set_reply("stray");
        assert!(transcript.is_empty());
    }

    #[test]
    fn message_serialization_shape() {
        let message = Message::user("Hello!");
        let json = to_value(&message).unwrap();

        assert_eq!(
            json,
            json!({
                "role": "user",
                "content": "Hello!"
            })
        );

        let message = Message::assistant("Hi.");
        let json = to_value(&message).unwrap();

        assert_eq!(
            json,
            json!({
                "role": "assistant",
                "content": "Hi."
            })
        );
    }

    #[test]
    fn from_messages_accepts_alternating_pairs() {
        let messages = vec![
            Message::user("q1"),
            Message::assistant("a1"),
            Message::user("q2"),
            Message::assistant("a2"),
        ];
        let transcript = Transcript::from_messages(messages).unwrap();
        assert_eq!(transcript.len(), 4);
    }

    #[test]
    fn from_messages_rejects_assistant_first() {
        let messages = vec![Message::assistant("a1")];
        let err = Transcript::from_messages(messages).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn from_messages_rejects_broken_alternation() {
        let messages = vec![
            Message::user("q1"),
            Message::user("q2"),
            Message::assistant("a1"),
        ];
        let err = Transcript::from_messages(messages).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn from_messages_rejects_unpaired_trailing_user() {
        let messages = vec![
            Message::user("q1"),
            Message::assistant("a1"),
            Message::user("q2"),
        ];
        let err = Transcript::from_messages(messages).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn clear_discards_everything() {
        let mut transcript = Transcript::new();
        transcript.begin_turn("q");
        transcript.set_reply("a");
        transcript.clear();
        assert!(transcript.is_empty());
    }
}
