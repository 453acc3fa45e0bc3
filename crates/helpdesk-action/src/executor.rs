//! Action executor.
//!
//! Dispatches a confirmed action through its handler exactly once: validate,
//! persist the completed record (with any conversation status transition) in
//! one transaction, then emit the best-effort notification. The conversation
//! orchestrator reuses `prepare` + `notify_prepared` so the record can join
//! the orchestrator's own persistence transaction instead.

use std::sync::Arc;

use tracing::warn;
use uuid::Uuid;

use helpdesk_core::types::{ActionKind, Conversation};
use helpdesk_storage::{ActionRepository, ConversationRepository, Database};

use crate::error::ActionError;
use crate::handler::ActionRegistry;
use crate::notify::Notifier;
use crate::types::{ActionOutcome, ActionPayload, PreparedAction};

/// Executes actions against the datastore, at most one per confirmed request.
pub struct ActionExecutor {
    registry: ActionRegistry,
    conversations: ConversationRepository,
    actions: ActionRepository,
    notifier: Arc<dyn Notifier>,
}

impl ActionExecutor {
    /// Build an executor with the default handler registry.
    pub fn new(db: Arc<Database>, notifier: Arc<dyn Notifier>) -> Self {
        let mut registry = ActionRegistry::new();
        registry.register_defaults();
        Self {
            registry,
            conversations: ConversationRepository::new(Arc::clone(&db)),
            actions: ActionRepository::new(db),
            notifier,
        }
    }

    /// Validate a payload and build the completed record without persisting.
    ///
    /// Validation failures (bad priority, missing phone) abort here, before
    /// any row exists.
    pub fn prepare(
        &self,
        conversation: &Conversation,
        kind: ActionKind,
        payload: &ActionPayload,
    ) -> Result<PreparedAction, ActionError> {
        let handler = self
            .registry
            .get(kind)
            .ok_or(ActionError::UnregisteredHandler(kind))?;
        handler.prepare(conversation, payload)
    }

    /// Execute a confirmed action end-to-end (the two-phase flow's second
    /// phase): validate, persist, notify.
    pub async fn execute(
        &self,
        conversation_id: Uuid,
        kind: ActionKind,
        payload: &ActionPayload,
    ) -> Result<ActionOutcome, ActionError> {
        let conversation = self
            .conversations
            .find_by_id(conversation_id)?
            .ok_or(ActionError::InvalidConversation(conversation_id))?;

        let prepared = self.prepare(&conversation, kind, payload)?;

        self.actions
            .insert_with_status(&prepared.record, prepared.status_change)?;

        self.notify_prepared(&prepared).await;

        Ok(ActionOutcome {
            action: prepared.record,
            confirmation: prepared.confirmation,
        })
    }

    /// Emit the prepared action's notification, swallowing failures.
    ///
    /// Called after the record has committed; a delivery failure is logged
    /// and never alters the action's status.
    pub async fn notify_prepared(&self, prepared: &PreparedAction) {
        let Some((event, payload)) = prepared.notification.as_ref() else {
            return;
        };
        if let Err(e) = self.notifier.notify(event, payload).await {
            warn!(event = %event, error = %e, "Notification delivery failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    use helpdesk_core::types::{ActionStatus, ConversationStatus};
    use helpdesk_storage::MessageRepository;

    use crate::notify::NotifyError;

    /// Notifier that records every event it receives.
    #[derive(Default)]
    struct RecordingNotifier {
        events: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify(
            &self,
            event: &str,
            _payload: &serde_json::Value,
        ) -> Result<(), NotifyError> {
            self.events.lock().unwrap().push(event.to_string());
            Ok(())
        }
    }

    /// Notifier whose delivery always fails.
    struct FailingNotifier;

    #[async_trait]
    impl Notifier for FailingNotifier {
        async fn notify(
            &self,
            _event: &str,
            _payload: &serde_json::Value,
        ) -> Result<(), NotifyError> {
            Err(NotifyError("smtp unreachable".to_string()))
        }
    }

    fn setup(
        notifier: Arc<dyn Notifier>,
    ) -> (ActionExecutor, ConversationRepository, ActionRepository) {
        let db = Arc::new(Database::in_memory().unwrap());
        (
            ActionExecutor::new(Arc::clone(&db), notifier),
            ConversationRepository::new(Arc::clone(&db)),
            ActionRepository::new(db),
        )
    }

    fn payload(json: serde_json::Value) -> ActionPayload {
        ActionPayload::new(json)
    }

    // ---- Happy paths ----

    #[tokio::test]
    async fn test_execute_return_creates_completed_row() {
        let (executor, conversations, actions) = setup(Arc::new(RecordingNotifier::default()));
        let conv = conversations.create("Ada", None, "en").unwrap();

        let outcome = executor
            .execute(
                conv.id,
                ActionKind::ReturnProduct,
                &payload(serde_json::json!({
                    "order_id": "123",
                    "product": "Widget",
                    "reason": "defective",
                })),
            )
            .await
            .unwrap();

        assert!(outcome.reference().unwrap().starts_with("RMA-"));
        let rows = actions.list_by_conversation(conv.id).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].status, ActionStatus::Completed);
        assert_eq!(rows[0].params["order_id"], "123");
    }

    #[tokio::test]
    async fn test_execute_ticket_escalates_conversation() {
        let notifier = Arc::new(RecordingNotifier::default());
        let (executor, conversations, _) = setup(Arc::clone(&notifier) as Arc<dyn Notifier>);
        let conv = conversations.create("Ada", None, "en").unwrap();

        let outcome = executor
            .execute(
                conv.id,
                ActionKind::CreateTicket,
                &payload(serde_json::json!({"summary": "broken", "priority": "high"})),
            )
            .await
            .unwrap();

        assert!(outcome.reference().unwrap().starts_with("TKT-"));
        assert_eq!(
            conversations.find_by_id(conv.id).unwrap().unwrap().status,
            ConversationStatus::Escalated
        );
        assert_eq!(
            notifier.events.lock().unwrap().as_slice(),
            ["ticket_created"]
        );
    }

    #[tokio::test]
    async fn test_execute_callback_notifies() {
        let notifier = Arc::new(RecordingNotifier::default());
        let (executor, conversations, _) = setup(Arc::clone(&notifier) as Arc<dyn Notifier>);
        let conv = conversations.create("Ada", None, "en").unwrap();

        executor
            .execute(
                conv.id,
                ActionKind::RequestCall,
                &payload(serde_json::json!({"phone_number": "555-0101"})),
            )
            .await
            .unwrap();

        assert_eq!(
            notifier.events.lock().unwrap().as_slice(),
            ["call_requested"]
        );
    }

    // ---- Validation failures create no rows ----

    #[tokio::test]
    async fn test_invalid_priority_creates_no_row_and_no_escalation() {
        let (executor, conversations, actions) = setup(Arc::new(RecordingNotifier::default()));
        let conv = conversations.create("Ada", None, "en").unwrap();

        let err = executor
            .execute(
                conv.id,
                ActionKind::CreateTicket,
                &payload(serde_json::json!({"summary": "x", "priority": "urgent"})),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ActionError::InvalidPriority(_)));
        assert_eq!(actions.count(conv.id).unwrap(), 0);
        assert_eq!(
            conversations.find_by_id(conv.id).unwrap().unwrap().status,
            ConversationStatus::Active,
            "failed validation must not flip the conversation"
        );
    }

    #[tokio::test]
    async fn test_missing_phone_creates_no_row() {
        let (executor, conversations, actions) = setup(Arc::new(RecordingNotifier::default()));
        let conv = conversations.create("Ada", None, "en").unwrap();

        let err = executor
            .execute(
                conv.id,
                ActionKind::RequestCall,
                &payload(serde_json::json!({"phone_number": ""})),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ActionError::MissingPhoneNumber));
        assert_eq!(actions.count(conv.id).unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unknown_conversation_rejected() {
        let (executor, _, _) = setup(Arc::new(RecordingNotifier::default()));
        let missing = Uuid::new_v4();

        let err = executor
            .execute(missing, ActionKind::ReturnProduct, &ActionPayload::default())
            .await
            .unwrap_err();

        assert!(matches!(err, ActionError::InvalidConversation(id) if id == missing));
    }

    // ---- Notification failures never affect the action ----

    #[tokio::test]
    async fn test_notification_failure_keeps_action_completed() {
        let (executor, conversations, actions) = setup(Arc::new(FailingNotifier));
        let conv = conversations.create("Ada", None, "en").unwrap();

        let outcome = executor
            .execute(
                conv.id,
                ActionKind::RequestCall,
                &payload(serde_json::json!({"phone_number": "555-0101"})),
            )
            .await
            .unwrap();

        assert!(!outcome.confirmation.is_empty());
        let rows = actions.list_by_conversation(conv.id).unwrap();
        assert_eq!(rows[0].status, ActionStatus::Completed);
    }

    // ---- Idempotence baseline ----

    #[tokio::test]
    async fn test_replayed_payload_creates_second_row() {
        // No dedup key exists; replaying a confirmed payload appends a second
        // row. Pinned as the regression baseline for the documented gap.
        let (executor, conversations, actions) = setup(Arc::new(RecordingNotifier::default()));
        let conv = conversations.create("Ada", None, "en").unwrap();
        let body = payload(serde_json::json!({"order_id": "123", "product": "Widget"}));

        let first = executor
            .execute(conv.id, ActionKind::ReturnProduct, &body)
            .await
            .unwrap();
        let second = executor
            .execute(conv.id, ActionKind::ReturnProduct, &body)
            .await
            .unwrap();

        assert_ne!(first.action.id, second.action.id);
        assert_ne!(first.reference(), second.reference());
        assert_eq!(actions.count(conv.id).unwrap(), 2);
    }

    // ---- Transcript untouched by standalone execution ----

    #[tokio::test]
    async fn test_execute_does_not_write_messages() {
        let db = Arc::new(Database::in_memory().unwrap());
        let executor = ActionExecutor::new(
            Arc::clone(&db),
            Arc::new(RecordingNotifier::default()),
        );
        let conversations = ConversationRepository::new(Arc::clone(&db));
        let messages = MessageRepository::new(db);
        let conv = conversations.create("Ada", None, "en").unwrap();

        executor
            .execute(
                conv.id,
                ActionKind::ReturnProduct,
                &payload(serde_json::json!({})),
            )
            .await
            .unwrap();

        assert!(messages.transcript(conv.id).unwrap().is_empty());
    }
}
