//! Product return handler.
//!
//! Issues a return merchandise authorization. Every field except the parent
//! conversation is optional: partial data is accepted and recorded as empty
//! rather than blocking the customer.

use chrono::Utc;
use uuid::Uuid;

use helpdesk_core::types::{ActionKind, ActionRecord, ActionStatus, Conversation};

use crate::error::ActionError;
use crate::handler::ActionHandler;
use crate::types::{rma_reference, ActionPayload, PreparedAction};

pub struct ReturnHandler;

impl ActionHandler for ReturnHandler {
    fn kind(&self) -> ActionKind {
        ActionKind::ReturnProduct
    }

    fn prepare(
        &self,
        conversation: &Conversation,
        payload: &ActionPayload,
    ) -> Result<PreparedAction, ActionError> {
        let reference = rma_reference();
        let record = ActionRecord {
            id: Uuid::new_v4(),
            conversation_id: conversation.id,
            kind: ActionKind::ReturnProduct,
            params: serde_json::json!({
                "order_id": payload.field("order_id"),
                "product": payload.field("product"),
                "reason": payload.field("reason"),
            }),
            status: ActionStatus::Completed,
            reference: Some(reference.clone()),
            created_at: Utc::now(),
        };

        let confirmation = format!(
            "Return authorized. RMA number: {}. Print the return label and drop the \
             package at any shipping location within 30 days.",
            reference
        );

        Ok(PreparedAction {
            record,
            confirmation,
            status_change: None,
            notification: None,
        })
    }
}
