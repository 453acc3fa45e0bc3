//! Callback request handler.
//!
//! Records a request for the support team to phone the customer back. The
//! phone number is the one required field — the callback cannot happen
//! without it — everything else is optional.

use chrono::Utc;
use uuid::Uuid;

use helpdesk_core::types::{ActionKind, ActionRecord, ActionStatus, Conversation};

use crate::error::ActionError;
use crate::handler::ActionHandler;
use crate::types::{ActionPayload, PreparedAction};

pub struct CallbackHandler;

impl ActionHandler for CallbackHandler {
    fn kind(&self) -> ActionKind {
        ActionKind::RequestCall
    }

    fn prepare(
        &self,
        conversation: &Conversation,
        payload: &ActionPayload,
    ) -> Result<PreparedAction, ActionError> {
        let phone_number = payload.field("phone_number");
        if phone_number.is_empty() {
            return Err(ActionError::MissingPhoneNumber);
        }

        let preferred_time = payload.field("preferred_time");
        let record = ActionRecord {
            id: Uuid::new_v4(),
            conversation_id: conversation.id,
            kind: ActionKind::RequestCall,
            params: serde_json::json!({
                "phone_number": phone_number,
                "preferred_time": preferred_time,
                "reason": payload.field("reason"),
            }),
            status: ActionStatus::Completed,
            reference: None,
            created_at: Utc::now(),
        };

        let confirmation = if preferred_time.is_empty() {
            format!(
                "Callback request recorded. Our team will call you at {} as soon as possible.",
                phone_number
            )
        } else {
            format!(
                "Callback request recorded. Our team will call you at {} around {}.",
                phone_number, preferred_time
            )
        };

        let notification = serde_json::json!({
            "phone_number": phone_number,
            "preferred_time": preferred_time,
            "reason": payload.field("reason"),
            "customer_name": conversation.customer_name,
            "conversation_id": conversation.id,
        });

        Ok(PreparedAction {
            record,
            confirmation,
            status_change: None,
            notification: Some(("call_requested".to_string(), notification)),
        })
    }
}
