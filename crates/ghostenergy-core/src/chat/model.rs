//! Chat session domain model.

use super::message::ChatMessage;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Title every session starts with until its first user message arrives.
pub const PLACEHOLDER_TITLE: &str = "Nuevo chat";

/// Maximum number of characters kept from the first user message.
pub const TITLE_MAX_CHARS: usize = 30;

/// One conversation thread with the assistant.
///
/// The title changes exactly once: from [`PLACEHOLDER_TITLE`] to a value
/// derived from the first user message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub messages: Vec<ChatMessage>,
}

impl ChatSession {
    /// Creates an empty session stamped with the given instant.
    pub fn new(created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: PLACEHOLDER_TITLE.to_string(),
            created_at,
            messages: Vec::new(),
        }
    }

    pub fn has_placeholder_title(&self) -> bool {
        self.title == PLACEHOLDER_TITLE
    }

    /// Returns a copy of this session with `message` appended.
    ///
    /// If the title is still the placeholder and the session now has a user
    /// message, the title is finalized from the first one.
    pub fn with_message(&self, message: ChatMessage) -> Self {
        let mut next = self.clone();
        next.messages.push(message);
        if next.has_placeholder_title() {
            if let Some(first) = next.messages.iter().find(|m| m.is_user()) {
                next.title = derive_title(&first.text);
            }
        }
        next
    }
}

/// Builds a session title from a user message.
///
/// Keeps the first [`TITLE_MAX_CHARS`] characters and appends `…` when
/// anything was cut.
pub fn derive_title(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(TITLE_MAX_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}…")
    } else {
        head
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_title_is_kept() {
        assert_eq!(derive_title("Why is sector A high?"), "Why is sector A high?");
    }

    #[test]
    fn test_exactly_thirty_chars_is_not_truncated() {
        let text = "a".repeat(30);
        assert_eq!(derive_title(&text), text);
    }

    #[test]
    fn test_long_title_is_truncated_with_ellipsis() {
        let text = "¿Cuál es el consumo total de energía este mes?";
        let title = derive_title(text);
        assert!(title.ends_with('…'));
        assert_eq!(title.chars().count(), TITLE_MAX_CHARS + 1);
        assert_eq!(title, "¿Cuál es el consumo total de e…");
    }

    #[test]
    fn test_title_set_once_from_first_user_message() {
        let session = ChatSession::new(Utc::now());
        assert!(session.has_placeholder_title());

        let session = session.with_message(ChatMessage::user("first question"));
        assert_eq!(session.title, "first question");

        let session = session
            .with_message(ChatMessage::assistant("answer"))
            .with_message(ChatMessage::user("second question"));
        assert_eq!(session.title, "first question");
        assert_eq!(session.messages.len(), 3);
    }

    #[test]
    fn test_assistant_message_alone_keeps_placeholder() {
        let session = ChatSession::new(Utc::now()).with_message(ChatMessage::assistant("hello"));
        assert!(session.has_placeholder_title());
    }
}
