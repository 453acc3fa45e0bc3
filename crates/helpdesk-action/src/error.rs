//! Error types for intent classification and action execution.

use helpdesk_core::error::HelpdeskError;
use helpdesk_core::types::ActionKind;
use uuid::Uuid;

/// Errors from action validation and execution.
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error("Unknown conversation: {0}")]
    InvalidConversation(Uuid),
    #[error("Invalid ticket priority: {0} (expected low, medium, or high)")]
    InvalidPriority(String),
    #[error("Phone number is required to schedule a callback")]
    MissingPhoneNumber,
    #[error("Payload validation failed: {0}")]
    InvalidPayload(String),
    #[error("Action kind not registered: {0}")]
    UnregisteredHandler(ActionKind),
    #[error("Storage error: {0}")]
    Storage(#[from] HelpdeskError),
}
