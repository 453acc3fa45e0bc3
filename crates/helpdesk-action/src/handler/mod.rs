//! Action handler trait and registry.
//!
//! One handler per action kind. Handlers validate the structured payload and
//! produce a [`PreparedAction`]; persistence and notification delivery are
//! the executor's concern, so a handler never touches storage or the network.

pub mod callback;
pub mod returns;
pub mod ticket;

use std::collections::HashMap;

use helpdesk_core::types::{ActionKind, Conversation};

use crate::error::ActionError;
use crate::types::{ActionPayload, PreparedAction};

/// Validates a payload and builds the action record for one kind.
pub trait ActionHandler: Send + Sync {
    /// The kind this handler serves.
    fn kind(&self) -> ActionKind;

    /// Validate the payload and produce the completed record, confirmation
    /// text, status transition, and notification. Validation failures abort
    /// before any record exists.
    fn prepare(
        &self,
        conversation: &Conversation,
        payload: &ActionPayload,
    ) -> Result<PreparedAction, ActionError>;
}

/// Registry dispatching action kinds to their handler implementation.
#[derive(Default)]
pub struct ActionRegistry {
    handlers: HashMap<ActionKind, Box<dyn ActionHandler>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register all built-in handlers.
    pub fn register_defaults(&mut self) {
        self.register(Box::new(ticket::TicketHandler));
        self.register(Box::new(returns::ReturnHandler));
        self.register(Box::new(callback::CallbackHandler));
    }

    /// Register a handler under its own kind, replacing any existing one.
    pub fn register(&mut self, handler: Box<dyn ActionHandler>) {
        self.handlers.insert(handler.kind(), handler);
    }

    /// Look up the handler for a kind.
    pub fn get(&self, kind: ActionKind) -> Option<&dyn ActionHandler> {
        self.handlers.get(&kind).map(|h| h.as_ref())
    }
}
