//! Conversation orchestration for Helpdesk.
//!
//! The orchestrator is the single entry point for the (excluded) HTTP/UI
//! layer: per customer message it retrieves knowledge context, builds the
//! completion prompt, calls the provider with a bounded retry, classifies
//! the customer's intent, optionally dispatches one action, and persists
//! the exchange as a single transactional unit.

pub mod context;
pub mod error;
pub mod orchestrator;
pub mod types;

pub use context::{fallback_reply, PromptBuilder};
pub use error::ChatError;
pub use orchestrator::ChatOrchestrator;
pub use types::{ActionTaken, CustomerReply};
