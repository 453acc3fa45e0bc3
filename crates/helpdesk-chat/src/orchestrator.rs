//! Conversation orchestrator.
//!
//! Owns the decision sequence per incoming customer message: retrieve
//! context, build the prompt, call the completion provider (one bounded
//! retry, then degrade to a static fallback), classify the customer's
//! intent, dispatch at most one action, and persist the whole exchange as a
//! single transaction.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::warn;
use uuid::Uuid;

use helpdesk_action::{
    ActionExecutor, ActionOutcome, ActionPayload, ConfirmedAction, IntentClassifier, Notifier,
};
use helpdesk_completion::{CompletionError, CompletionProvider};
use helpdesk_core::config::{ChatConfig, HelpdeskConfig};
use helpdesk_core::types::{ActionKind, ConversationStatus, MessageRecord, Sender};
use helpdesk_storage::{
    ConversationRepository, Database, ExchangeRecord, FragmentSearch, MessageRepository,
};

use crate::context::{fallback_reply, PromptBuilder};
use crate::error::ChatError;
use crate::types::{ActionTaken, CustomerReply};

/// Central coordinator wiring retrieval, completion, classification, and
/// action dispatch. The sole entry point consumed by the HTTP/UI layer.
pub struct ChatOrchestrator {
    conversations: ConversationRepository,
    messages: MessageRepository,
    search: FragmentSearch,
    provider: Arc<dyn CompletionProvider>,
    classifier: IntentClassifier,
    executor: ActionExecutor,
    prompt_builder: PromptBuilder,
    chat: ChatConfig,
    timeout_secs: u64,
    retry_backoff_ms: u64,
}

impl ChatOrchestrator {
    /// Wire an orchestrator over the shared database, provider, and notifier.
    pub fn new(
        db: Arc<Database>,
        provider: Arc<dyn CompletionProvider>,
        notifier: Arc<dyn Notifier>,
        config: &HelpdeskConfig,
    ) -> Self {
        Self {
            conversations: ConversationRepository::new(Arc::clone(&db)),
            messages: MessageRepository::new(Arc::clone(&db)),
            search: FragmentSearch::new(Arc::clone(&db)),
            provider,
            classifier: IntentClassifier::new(),
            executor: ActionExecutor::new(db, notifier),
            prompt_builder: PromptBuilder::new(&config.chat),
            chat: config.chat.clone(),
            timeout_secs: config.completion.timeout_secs,
            retry_backoff_ms: config.completion.retry_backoff_ms,
        }
    }

    /// Handle one incoming customer message.
    ///
    /// `confirmed_action` carries the parameters the caller collected and
    /// confirmed through the two-phase flow; without it, a classified intent
    /// is only proposed, never executed.
    pub async fn handle_customer_message(
        &self,
        conversation_id: Uuid,
        text: &str,
        confirmed_action: Option<ConfirmedAction>,
    ) -> Result<CustomerReply, ChatError> {
        // Input validation: fail fast, never retried.
        let text = text.trim();
        if text.is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        if text.chars().count() > self.chat.max_message_len {
            return Err(ChatError::MessageTooLong(self.chat.max_message_len));
        }

        let conversation = self
            .conversations
            .find_by_id(conversation_id)?
            .ok_or(ChatError::InvalidConversation(conversation_id))?;
        if conversation.status == ConversationStatus::Resolved {
            return Err(ChatError::ConversationClosed(conversation_id));
        }

        // Step 1: context retrieval. No fragments is not an error.
        let fragments = self.search.retrieve(
            text,
            self.chat.max_fragments as u64,
            self.chat.fragment_char_budget,
        )?;

        // Step 2: prompt construction over the bounded history window.
        let history = self
            .messages
            .recent(conversation.id, self.chat.history_turns as u64)?;
        let prompt = self
            .prompt_builder
            .build(&conversation, &fragments, &history, text);

        // Step 3: completion with one bounded retry, then degrade.
        let completion = self.complete_with_retry(&prompt).await;
        let degraded = completion.is_none();
        let mut reply_text =
            completion.unwrap_or_else(|| fallback_reply(&conversation.language).to_string());

        // Steps 4-5: classification and dispatch. Classification runs over
        // the customer's message, never the AI reply; the lexical branch is
        // pure and works even when the provider is down, the model-assisted
        // branch is skipped on the degraded path.
        let mut prepared = None;
        let action_taken = if let Some(confirmed) = confirmed_action {
            match self
                .executor
                .prepare(&conversation, confirmed.kind, &confirmed.payload)
            {
                Ok(p) => {
                    reply_text.push_str("\n\n");
                    reply_text.push_str(&p.confirmation);
                    let outcome = ActionOutcome {
                        action: p.record.clone(),
                        confirmation: p.confirmation.clone(),
                    };
                    prepared = Some(p);
                    Some(ActionTaken::Executed { outcome })
                }
                Err(e) => {
                    reply_text.push_str(&format!(
                        "\n\nI couldn't complete the {} request: {}",
                        confirmed.kind, e
                    ));
                    Some(ActionTaken::Failed {
                        kind: confirmed.kind,
                        error: e.to_string(),
                    })
                }
            }
        } else {
            let classified = if degraded {
                self.classifier.classify(text)
            } else {
                self.classifier
                    .classify_with_fallback(text, self.provider.as_ref())
                    .await
            };
            classified.map(|intent| ActionTaken::Proposed { intent })
        };

        // Step 6: persist the exchange as one all-or-nothing unit.
        let now = Utc::now();
        let customer_message = MessageRecord {
            id: Uuid::new_v4(),
            conversation_id: conversation.id,
            sender: Sender::Customer,
            text: text.to_string(),
            timestamp: now,
            source_fragment_id: None,
        };
        let ai_message = MessageRecord {
            id: Uuid::new_v4(),
            conversation_id: conversation.id,
            sender: Sender::Ai,
            text: reply_text.clone(),
            timestamp: now,
            source_fragment_id: fragments.first().map(|f| f.id),
        };
        let exchange = ExchangeRecord {
            customer_message,
            ai_message,
            action: prepared.as_ref().map(|p| p.record.clone()),
            status_change: prepared.as_ref().and_then(|p| p.status_change),
        };
        self.conversations
            .record_exchange(&exchange)
            .map_err(|e| ChatError::Persistence(e.to_string()))?;

        // Notification goes out only after the record committed.
        if let Some(ref p) = prepared {
            self.executor.notify_prepared(p).await;
        }

        let mut sources = Vec::new();
        for fragment in &fragments {
            if !sources.contains(&fragment.filename) {
                sources.push(fragment.filename.clone());
            }
        }

        Ok(CustomerReply {
            reply_text,
            action_taken,
            sources,
        })
    }

    /// Execute a confirmed action outside the message flow (the two-phase
    /// confirm-then-execute entry point).
    pub async fn execute_action(
        &self,
        conversation_id: Uuid,
        kind: ActionKind,
        payload: &ActionPayload,
    ) -> Result<ActionOutcome, helpdesk_action::ActionError> {
        self.executor.execute(conversation_id, kind, payload).await
    }

    /// One completion attempt guarded by the configured timeout.
    async fn try_complete(&self, prompt: &str) -> Result<String, CompletionError> {
        match tokio::time::timeout(
            Duration::from_secs(self.timeout_secs),
            self.provider.complete(prompt),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(CompletionError::Timeout(self.timeout_secs)),
        }
    }

    /// Completion with a single backoff retry; `None` means degraded.
    async fn complete_with_retry(&self, prompt: &str) -> Option<String> {
        match self.try_complete(prompt).await {
            Ok(text) => Some(text),
            Err(first) => {
                warn!(error = %first, "Completion attempt failed, retrying once");
                tokio::time::sleep(Duration::from_millis(self.retry_backoff_ms)).await;
                match self.try_complete(prompt).await {
                    Ok(text) => Some(text),
                    Err(second) => {
                        warn!(error = %second, "Completion retry failed, degrading to fallback reply");
                        None
                    }
                }
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
