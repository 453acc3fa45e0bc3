//! Reply types returned by the conversation orchestrator.

use serde::Serialize;

use helpdesk_action::{ActionOutcome, ClassifiedIntent};
use helpdesk_core::types::ActionKind;

/// What happened on the action side of a handled message.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ActionTaken {
    /// An intent was classified; the caller should collect the kind's
    /// parameters and confirm via `execute_action`.
    Proposed { intent: ClassifiedIntent },
    /// A confirmed action executed; its record is persisted.
    Executed { outcome: ActionOutcome },
    /// A confirmed action failed validation or execution; no record exists
    /// beyond what the error describes, and the reply says so.
    Failed { kind: ActionKind, error: String },
}

/// The composed result of one handled customer message.
#[derive(Debug, Clone, Serialize)]
pub struct CustomerReply {
    /// Never empty: the fallback reply covers provider failure.
    pub reply_text: String,
    /// At most one action per message.
    pub action_taken: Option<ActionTaken>,
    /// Filenames of the documents whose fragments grounded the reply.
    pub sources: Vec<String>,
}
