//! Support ticket handler.
//!
//! Escalates a conversation to human support: issues a ticket reference,
//! flips the conversation to Escalated, and notifies the support inbox.

use std::str::FromStr;

use chrono::Utc;
use uuid::Uuid;

use helpdesk_core::types::{
    ActionKind, ActionRecord, ActionStatus, Conversation, ConversationStatus, TicketPriority,
};

use crate::error::ActionError;
use crate::handler::ActionHandler;
use crate::types::{ticket_reference, ActionPayload, PreparedAction};

/// Default issue summary when the customer supplied none.
const DEFAULT_SUMMARY: &str = "Customer support required";

pub struct TicketHandler;

impl ActionHandler for TicketHandler {
    fn kind(&self) -> ActionKind {
        ActionKind::CreateTicket
    }

    fn prepare(
        &self,
        conversation: &Conversation,
        payload: &ActionPayload,
    ) -> Result<PreparedAction, ActionError> {
        let raw_priority = payload.field("priority");
        let priority = if raw_priority.is_empty() {
            TicketPriority::default()
        } else {
            TicketPriority::from_str(&raw_priority.to_lowercase())
                .map_err(|_| ActionError::InvalidPriority(raw_priority.to_string()))?
        };

        let summary = match payload.field("summary") {
            "" => DEFAULT_SUMMARY.to_string(),
            s => s.to_string(),
        };

        let reference = ticket_reference();
        let record = ActionRecord {
            id: Uuid::new_v4(),
            conversation_id: conversation.id,
            kind: ActionKind::CreateTicket,
            params: serde_json::json!({
                "summary": summary,
                "priority": priority.to_string(),
            }),
            status: ActionStatus::Completed,
            reference: Some(reference.clone()),
            created_at: Utc::now(),
        };

        let confirmation = format!(
            "Support ticket {} created. Our team will respond within 24 hours.",
            reference
        );

        let notification = serde_json::json!({
            "ticket_id": reference,
            "summary": summary,
            "priority": priority.to_string(),
            "customer_name": conversation.customer_name,
            "customer_email": conversation.customer_email,
            "conversation_id": conversation.id,
        });

        Ok(PreparedAction {
            record,
            confirmation,
            status_change: Some(ConversationStatus::Escalated),
            notification: Some(("ticket_created".to_string(), notification)),
        })
    }
}
