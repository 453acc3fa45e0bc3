use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Canonical timestamp type used across all crates.
pub type Timestamp = DateTime<Utc>;

// =============================================================================
// Enums
// =============================================================================

/// Lifecycle status of a customer conversation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationStatus {
    /// Conversation is open and accepting messages.
    #[default]
    Active,
    /// Closed by an admin or the customer; no further messages accepted.
    Resolved,
    /// A support ticket was created; a human will follow up.
    Escalated,
}

impl fmt::Display for ConversationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversationStatus::Active => write!(f, "active"),
            ConversationStatus::Resolved => write!(f, "resolved"),
            ConversationStatus::Escalated => write!(f, "escalated"),
        }
    }
}

impl std::str::FromStr for ConversationStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(ConversationStatus::Active),
            "resolved" => Ok(ConversationStatus::Resolved),
            "escalated" => Ok(ConversationStatus::Escalated),
            _ => Err(format!("Unknown conversation status: {}", s)),
        }
    }
}

/// Who authored a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    Customer,
    Ai,
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sender::Customer => write!(f, "customer"),
            Sender::Ai => write!(f, "ai"),
        }
    }
}

impl std::str::FromStr for Sender {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Sender::Customer),
            "ai" => Ok(Sender::Ai),
            _ => Err(format!("Unknown sender: {}", s)),
        }
    }
}

/// The closed set of actions the pipeline can dispatch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    CreateTicket,
    ReturnProduct,
    RequestCall,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionKind::CreateTicket => write!(f, "create_ticket"),
            ActionKind::ReturnProduct => write!(f, "return_product"),
            ActionKind::RequestCall => write!(f, "request_call"),
        }
    }
}

impl std::str::FromStr for ActionKind {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create_ticket" => Ok(ActionKind::CreateTicket),
            "return_product" => Ok(ActionKind::ReturnProduct),
            "request_call" => Ok(ActionKind::RequestCall),
            _ => Err(format!("Unknown action kind: {}", s)),
        }
    }
}

/// Lifecycle status of a dispatched action.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    Pending,
    Completed,
    Failed,
}

impl fmt::Display for ActionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionStatus::Pending => write!(f, "pending"),
            ActionStatus::Completed => write!(f, "completed"),
            ActionStatus::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for ActionStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ActionStatus::Pending),
            "completed" => Ok(ActionStatus::Completed),
            "failed" => Ok(ActionStatus::Failed),
            _ => Err(format!("Unknown action status: {}", s)),
        }
    }
}

/// Ticket priority accepted by the create_ticket action.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl fmt::Display for TicketPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TicketPriority::Low => write!(f, "low"),
            TicketPriority::Medium => write!(f, "medium"),
            TicketPriority::High => write!(f, "high"),
        }
    }
}

impl std::str::FromStr for TicketPriority {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(TicketPriority::Low),
            "medium" => Ok(TicketPriority::Medium),
            "high" => Ok(TicketPriority::High),
            _ => Err(format!("Unknown ticket priority: {}", s)),
        }
    }
}

// =============================================================================
// Domain Structs
// =============================================================================

/// A customer support conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: Uuid,
    pub customer_name: String,
    pub customer_email: Option<String>,
    /// Short language tag for the conversation ("en", "hi", "te").
    pub language: String,
    pub started_at: Timestamp,
    pub status: ConversationStatus,
}

/// A single message in a conversation transcript.
///
/// Messages are immutable once created; the transcript is append-only and
/// ordered exactly as produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRecord {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub sender: Sender,
    pub text: String,
    pub timestamp: Timestamp,
    /// Knowledge fragment used to ground an AI reply, when one was.
    pub source_fragment_id: Option<Uuid>,
}

/// A dispatched action and its final status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionRecord {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub kind: ActionKind,
    /// Structured parameters; field schema depends on `kind`.
    pub params: serde_json::Value,
    pub status: ActionStatus,
    /// Customer-facing reference token (ticket id or RMA number).
    pub reference: Option<String>,
    pub created_at: Timestamp,
}

/// An uploaded knowledge-base document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: Uuid,
    pub filename: String,
    pub uploaded_at: Timestamp,
}

/// A retrievable chunk of ingested document content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeFragment {
    pub id: Uuid,
    pub document_id: Uuid,
    pub text: String,
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    // ---- Display / FromStr round trips ----

    #[test]
    fn test_conversation_status_round_trip() {
        for status in [
            ConversationStatus::Active,
            ConversationStatus::Resolved,
            ConversationStatus::Escalated,
        ] {
            let s = status.to_string();
            assert_eq!(ConversationStatus::from_str(&s).unwrap(), status);
        }
    }

    #[test]
    fn test_sender_round_trip() {
        for sender in [Sender::Customer, Sender::Ai] {
            let s = sender.to_string();
            assert_eq!(Sender::from_str(&s).unwrap(), sender);
        }
    }

    #[test]
    fn test_action_kind_round_trip() {
        for kind in [
            ActionKind::CreateTicket,
            ActionKind::ReturnProduct,
            ActionKind::RequestCall,
        ] {
            let s = kind.to_string();
            assert_eq!(ActionKind::from_str(&s).unwrap(), kind);
        }
    }

    #[test]
    fn test_action_status_round_trip() {
        for status in [
            ActionStatus::Pending,
            ActionStatus::Completed,
            ActionStatus::Failed,
        ] {
            let s = status.to_string();
            assert_eq!(ActionStatus::from_str(&s).unwrap(), status);
        }
    }

    #[test]
    fn test_ticket_priority_round_trip() {
        for priority in [
            TicketPriority::Low,
            TicketPriority::Medium,
            TicketPriority::High,
        ] {
            let s = priority.to_string();
            assert_eq!(TicketPriority::from_str(&s).unwrap(), priority);
        }
    }

    // ---- Rejections ----

    #[test]
    fn test_unknown_strings_rejected() {
        assert!(ConversationStatus::from_str("open").is_err());
        assert!(Sender::from_str("bot").is_err());
        assert!(ActionKind::from_str("draft_email").is_err());
        assert!(ActionStatus::from_str("done").is_err());
        assert!(TicketPriority::from_str("urgent").is_err());
    }

    #[test]
    fn test_priority_is_case_sensitive() {
        // "HIGH" is not a valid enum value; callers normalize before parsing.
        assert!(TicketPriority::from_str("HIGH").is_err());
    }

    // ---- Serde representation ----

    #[test]
    fn test_serde_snake_case() {
        assert_eq!(
            serde_json::to_string(&ActionKind::CreateTicket).unwrap(),
            "\"create_ticket\""
        );
        assert_eq!(
            serde_json::to_string(&ConversationStatus::Escalated).unwrap(),
            "\"escalated\""
        );
        assert_eq!(serde_json::to_string(&Sender::Ai).unwrap(), "\"ai\"");
    }

    #[test]
    fn test_serde_deserialize_kind() {
        let kind: ActionKind = serde_json::from_str("\"request_call\"").unwrap();
        assert_eq!(kind, ActionKind::RequestCall);
    }

    // ---- Defaults ----

    #[test]
    fn test_defaults() {
        assert_eq!(ConversationStatus::default(), ConversationStatus::Active);
        assert_eq!(TicketPriority::default(), TicketPriority::Medium);
    }

    // ---- Struct serde round trip ----

    #[test]
    fn test_action_record_serde_round_trip() {
        let record = ActionRecord {
            id: Uuid::new_v4(),
            conversation_id: Uuid::new_v4(),
            kind: ActionKind::ReturnProduct,
            params: serde_json::json!({"order_id": "123", "product": "Widget"}),
            status: ActionStatus::Completed,
            reference: Some("RMA-0A1B2C3D".to_string()),
            created_at: Utc::now(),
        };
        let json = serde_json::to_string(&record).unwrap();
        let back: ActionRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, record.id);
        assert_eq!(back.kind, ActionKind::ReturnProduct);
        assert_eq!(back.reference.as_deref(), Some("RMA-0A1B2C3D"));
    }
}
