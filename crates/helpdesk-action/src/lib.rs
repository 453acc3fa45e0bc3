//! Intent classification and action execution for Helpdesk.
//!
//! Classifies customer messages against the closed action set (lexical
//! patterns first, model-assisted fallback second) and dispatches confirmed
//! actions through pluggable per-kind handlers.

pub mod error;
pub mod executor;
pub mod handler;
pub mod intent;
pub mod notify;
pub mod types;

pub use error::ActionError;
pub use executor::ActionExecutor;
pub use handler::{ActionHandler, ActionRegistry};
pub use intent::{ClassifiedIntent, ClassifierOrigin, IntentClassifier};
pub use notify::{LogNotifier, Notifier, NotifyError};
pub use types::{ActionOutcome, ActionPayload, ConfirmedAction, PreparedAction};
