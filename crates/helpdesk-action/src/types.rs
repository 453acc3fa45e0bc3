//! Value objects shared across the action engine.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use helpdesk_core::types::{ActionKind, ActionRecord, ConversationStatus};

/// Structured parameters passed to action handlers.
///
/// Always a JSON object; field schema depends on the action kind.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActionPayload {
    pub data: serde_json::Value,
}

impl ActionPayload {
    pub fn new(data: serde_json::Value) -> Self {
        Self { data }
    }

    /// Fetch a string field, trimmed; absent or non-string fields read as "".
    pub fn field(&self, name: &str) -> &str {
        self.data
            .get(name)
            .and_then(|v| v.as_str())
            .map(str::trim)
            .unwrap_or("")
    }
}

/// An action the caller has collected parameters for and confirmed.
#[derive(Debug, Clone)]
pub struct ConfirmedAction {
    pub kind: ActionKind,
    pub payload: ActionPayload,
}

/// A validated action ready to be persisted.
///
/// Produced by a handler; carries the completed record, the customer-facing
/// confirmation text, the conversation status transition (if any), and the
/// notification to emit after the record commits.
#[derive(Debug, Clone)]
pub struct PreparedAction {
    pub record: ActionRecord,
    pub confirmation: String,
    pub status_change: Option<ConversationStatus>,
    pub notification: Option<(String, serde_json::Value)>,
}

/// The result of a successfully executed action.
#[derive(Debug, Clone, Serialize)]
pub struct ActionOutcome {
    pub action: ActionRecord,
    pub confirmation: String,
}

impl ActionOutcome {
    /// The customer-facing reference token, when the kind issues one.
    pub fn reference(&self) -> Option<&str> {
        self.action.reference.as_deref()
    }
}

/// Generate a process-unique, type-prefixed ticket reference.
pub fn ticket_reference() -> String {
    reference_with_prefix("TKT")
}

/// Generate a process-unique, type-prefixed return authorization reference.
pub fn rma_reference() -> String {
    reference_with_prefix("RMA")
}

fn reference_with_prefix(prefix: &str) -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("{}-{}", prefix, &id[..8].to_uppercase())
}
