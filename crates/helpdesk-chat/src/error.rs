//! Error types for the conversation orchestrator.

use helpdesk_core::error::HelpdeskError;
use uuid::Uuid;

/// Errors surfaced by `handle_customer_message`.
///
/// Invalid-input variants are returned immediately and never retried.
/// `Persistence` names the failing write stage, since silently losing a
/// customer's message or action request is unacceptable. Provider failures
/// never appear here — they degrade to the fallback reply instead.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("Unknown conversation: {0}")]
    InvalidConversation(Uuid),
    #[error("Conversation is closed: {0}")]
    ConversationClosed(Uuid),
    #[error("Message text is empty")]
    EmptyMessage,
    #[error("Message exceeds {0} characters")]
    MessageTooLong(usize),
    #[error("Persistence failed: {0}")]
    Persistence(String),
    #[error("Storage error: {0}")]
    Storage(#[from] HelpdeskError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let id = Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap();
        assert_eq!(
            ChatError::InvalidConversation(id).to_string(),
            "Unknown conversation: 550e8400-e29b-41d4-a716-446655440000"
        );
        assert_eq!(
            ChatError::ConversationClosed(id).to_string(),
            "Conversation is closed: 550e8400-e29b-41d4-a716-446655440000"
        );
        assert_eq!(ChatError::EmptyMessage.to_string(), "Message text is empty");
        assert_eq!(
            ChatError::MessageTooLong(2000).to_string(),
            "Message exceeds 2000 characters"
        );
        assert_eq!(
            ChatError::Persistence("Failed to save message: disk full".to_string()).to_string(),
            "Persistence failed: Failed to save message: disk full"
        );
    }

    #[test]
    fn test_from_helpdesk_error() {
        let err: ChatError = HelpdeskError::Search("fts broken".to_string()).into();
        assert!(matches!(err, ChatError::Storage(_)));
        assert!(err.to_string().contains("fts broken"));
    }
}
