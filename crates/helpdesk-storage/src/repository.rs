//! Repository implementations for SQLite-backed persistence.
//!
//! Provides conversation, message, action, and document repositories that
//! operate on the Database struct using raw SQL, plus the transactional
//! exchange writer used by the conversation orchestrator.

use std::str::FromStr;
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use rusqlite::{Connection, OptionalExtension};
use uuid::Uuid;

use helpdesk_core::error::HelpdeskError;
use helpdesk_core::types::{
    ActionRecord, ActionStatus, Conversation, ConversationStatus, Document, KnowledgeFragment,
    MessageRecord, Sender,
};

use crate::db::Database;

// =============================================================================
// Row mapping helpers
// =============================================================================

fn parse_uuid(s: &str) -> Result<Uuid, HelpdeskError> {
    Uuid::parse_str(s).map_err(|e| HelpdeskError::Storage(format!("Invalid UUID: {}", e)))
}

fn epoch_to_utc(epoch: i64) -> chrono::DateTime<Utc> {
    Utc.timestamp_opt(epoch, 0).single().unwrap_or_default()
}

fn row_to_conversation(
    row: (String, String, Option<String>, String, i64, String),
) -> Result<Conversation, HelpdeskError> {
    let (id, customer_name, customer_email, language, started_at, status) = row;
    Ok(Conversation {
        id: parse_uuid(&id)?,
        customer_name,
        customer_email,
        language,
        started_at: epoch_to_utc(started_at),
        status: ConversationStatus::from_str(&status).map_err(HelpdeskError::Storage)?,
    })
}

fn row_to_message(
    row: (String, String, String, String, i64, Option<String>),
) -> Result<MessageRecord, HelpdeskError> {
    let (id, conversation_id, sender, text, timestamp, source_fragment_id) = row;
    Ok(MessageRecord {
        id: parse_uuid(&id)?,
        conversation_id: parse_uuid(&conversation_id)?,
        sender: Sender::from_str(&sender).map_err(HelpdeskError::Storage)?,
        text,
        timestamp: epoch_to_utc(timestamp),
        source_fragment_id: source_fragment_id.as_deref().map(parse_uuid).transpose()?,
    })
}

fn row_to_action(
    row: (String, String, String, String, String, Option<String>, i64),
) -> Result<ActionRecord, HelpdeskError> {
    let (id, conversation_id, kind, params, status, reference, created_at) = row;
    Ok(ActionRecord {
        id: parse_uuid(&id)?,
        conversation_id: parse_uuid(&conversation_id)?,
        kind: helpdesk_core::types::ActionKind::from_str(&kind).map_err(HelpdeskError::Storage)?,
        params: serde_json::from_str(&params)?,
        status: ActionStatus::from_str(&status).map_err(HelpdeskError::Storage)?,
        reference,
        created_at: epoch_to_utc(created_at),
    })
}

// =============================================================================
// Connection-level writers (shared between repositories and transactions)
// =============================================================================

pub(crate) fn insert_message(conn: &Connection, msg: &MessageRecord) -> Result<(), HelpdeskError> {
    conn.execute(
        "INSERT INTO messages (id, conversation_id, sender, text, timestamp, source_fragment_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![
            msg.id.to_string(),
            msg.conversation_id.to_string(),
            msg.sender.to_string(),
            msg.text,
            msg.timestamp.timestamp(),
            msg.source_fragment_id.map(|id| id.to_string()),
        ],
    )
    .map_err(|e| HelpdeskError::Storage(format!("Failed to save message: {}", e)))?;
    Ok(())
}

pub(crate) fn insert_action(conn: &Connection, action: &ActionRecord) -> Result<(), HelpdeskError> {
    conn.execute(
        "INSERT INTO actions (id, conversation_id, kind, params, status, reference, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        rusqlite::params![
            action.id.to_string(),
            action.conversation_id.to_string(),
            action.kind.to_string(),
            serde_json::to_string(&action.params)?,
            action.status.to_string(),
            action.reference,
            action.created_at.timestamp(),
        ],
    )
    .map_err(|e| HelpdeskError::Storage(format!("Failed to save action: {}", e)))?;
    Ok(())
}

pub(crate) fn set_conversation_status(
    conn: &Connection,
    id: Uuid,
    status: ConversationStatus,
) -> Result<(), HelpdeskError> {
    let changed = conn
        .execute(
            "UPDATE conversations SET status = ?1 WHERE id = ?2",
            rusqlite::params![status.to_string(), id.to_string()],
        )
        .map_err(|e| HelpdeskError::Storage(format!("Failed to update conversation status: {}", e)))?;
    if changed == 0 {
        return Err(HelpdeskError::Storage(format!(
            "Failed to update conversation status: no such conversation {}",
            id
        )));
    }
    Ok(())
}

// =============================================================================
// ConversationRepository
// =============================================================================

/// A conversation plus its transcript size, for admin listings.
#[derive(Debug, Clone)]
pub struct ConversationSummary {
    pub conversation: Conversation,
    pub message_count: u64,
}

/// The atomic unit persisted per handled customer message: the message pair,
/// an optional action, and an optional status transition. Written in a single
/// transaction so a partial failure never leaves an action without its
/// triggering message or a status flip without its action.
#[derive(Debug, Clone)]
pub struct ExchangeRecord {
    pub customer_message: MessageRecord,
    pub ai_message: MessageRecord,
    pub action: Option<ActionRecord>,
    pub status_change: Option<ConversationStatus>,
}

/// Repository for conversations.
pub struct ConversationRepository {
    db: Arc<Database>,
}

impl ConversationRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Create a new conversation on first customer contact.
    pub fn create(
        &self,
        customer_name: &str,
        customer_email: Option<&str>,
        language: &str,
    ) -> Result<Conversation, HelpdeskError> {
        let conversation = Conversation {
            id: Uuid::new_v4(),
            customer_name: customer_name.to_string(),
            customer_email: customer_email.map(|s| s.to_string()),
            language: language.to_string(),
            started_at: Utc::now(),
            status: ConversationStatus::Active,
        };

        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO conversations (id, customer_name, customer_email, language, started_at, status)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![
                    conversation.id.to_string(),
                    conversation.customer_name,
                    conversation.customer_email,
                    conversation.language,
                    conversation.started_at.timestamp(),
                    conversation.status.to_string(),
                ],
            )
            .map_err(|e| HelpdeskError::Storage(format!("Failed to create conversation: {}", e)))?;
            Ok(())
        })?;

        Ok(conversation)
    }

    /// Find a conversation by ID.
    pub fn find_by_id(&self, id: Uuid) -> Result<Option<Conversation>, HelpdeskError> {
        self.db.with_conn(|conn| {
            let result = conn
                .query_row(
                    "SELECT id, customer_name, customer_email, language, started_at, status
                     FROM conversations WHERE id = ?1",
                    rusqlite::params![id.to_string()],
                    |row| {
                        Ok((
                            row.get::<_, String>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, Option<String>>(2)?,
                            row.get::<_, String>(3)?,
                            row.get::<_, i64>(4)?,
                            row.get::<_, String>(5)?,
                        ))
                    },
                )
                .optional()
                .map_err(|e| HelpdeskError::Storage(e.to_string()))?;

            result.map(row_to_conversation).transpose()
        })
    }

    /// Update a conversation's status.
    pub fn update_status(
        &self,
        id: Uuid,
        status: ConversationStatus,
    ) -> Result<(), HelpdeskError> {
        self.db.with_conn(|conn| set_conversation_status(conn, id, status))
    }

    /// List all conversations with message counts, newest first.
    pub fn list_with_counts(&self) -> Result<Vec<ConversationSummary>, HelpdeskError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT c.id, c.customer_name, c.customer_email, c.language,
                            c.started_at, c.status, COUNT(m.id)
                     FROM conversations c
                     LEFT JOIN messages m ON c.id = m.conversation_id
                     GROUP BY c.id
                     ORDER BY c.started_at DESC",
                )
                .map_err(|e| HelpdeskError::Storage(e.to_string()))?;

            let rows = stmt
                .query_map([], |row| {
                    Ok((
                        (
                            row.get::<_, String>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, Option<String>>(2)?,
                            row.get::<_, String>(3)?,
                            row.get::<_, i64>(4)?,
                            row.get::<_, String>(5)?,
                        ),
                        row.get::<_, i64>(6)?,
                    ))
                })
                .map_err(|e| HelpdeskError::Storage(e.to_string()))?;

            let mut summaries = Vec::new();
            for row in rows {
                let (conv_row, count) = row.map_err(|e| HelpdeskError::Storage(e.to_string()))?;
                summaries.push(ConversationSummary {
                    conversation: row_to_conversation(conv_row)?,
                    message_count: count as u64,
                });
            }
            Ok(summaries)
        })
    }

    /// Persist a handled exchange as a single all-or-nothing unit.
    pub fn record_exchange(&self, exchange: &ExchangeRecord) -> Result<(), HelpdeskError> {
        self.db.with_tx(|tx| {
            insert_message(tx, &exchange.customer_message)?;
            insert_message(tx, &exchange.ai_message)?;
            if let Some(ref action) = exchange.action {
                insert_action(tx, action)?;
            }
            if let Some(status) = exchange.status_change {
                set_conversation_status(tx, exchange.customer_message.conversation_id, status)?;
            }
            Ok(())
        })
    }
}

// =============================================================================
// MessageRepository
// =============================================================================

/// Repository for conversation transcripts.
pub struct MessageRepository {
    db: Arc<Database>,
}

impl MessageRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Append a single message.
    pub fn append(&self, msg: &MessageRecord) -> Result<(), HelpdeskError> {
        self.db.with_conn(|conn| insert_message(conn, msg))
    }

    /// Fetch the trailing window of a conversation, oldest first.
    ///
    /// Returns at most `limit` of the most recent messages, re-ordered so the
    /// caller sees them in transcript order.
    pub fn recent(&self, conversation_id: Uuid, limit: u64) -> Result<Vec<MessageRecord>, HelpdeskError> {
        let mut messages = self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id, conversation_id, sender, text, timestamp, source_fragment_id
                     FROM messages
                     WHERE conversation_id = ?1
                     ORDER BY timestamp DESC, rowid DESC
                     LIMIT ?2",
                )
                .map_err(|e| HelpdeskError::Storage(e.to_string()))?;

            let rows = stmt
                .query_map(rusqlite::params![conversation_id.to_string(), limit], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, i64>(4)?,
                        row.get::<_, Option<String>>(5)?,
                    ))
                })
                .map_err(|e| HelpdeskError::Storage(e.to_string()))?;

            let mut messages = Vec::new();
            for row in rows {
                let msg = row.map_err(|e| HelpdeskError::Storage(e.to_string()))?;
                messages.push(row_to_message(msg)?);
            }
            Ok(messages)
        })?;

        messages.reverse();
        Ok(messages)
    }

    /// Fetch the full transcript of a conversation in order.
    pub fn transcript(&self, conversation_id: Uuid) -> Result<Vec<MessageRecord>, HelpdeskError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id, conversation_id, sender, text, timestamp, source_fragment_id
                     FROM messages
                     WHERE conversation_id = ?1
                     ORDER BY timestamp ASC, rowid ASC",
                )
                .map_err(|e| HelpdeskError::Storage(e.to_string()))?;

            let rows = stmt
                .query_map(rusqlite::params![conversation_id.to_string()], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, i64>(4)?,
                        row.get::<_, Option<String>>(5)?,
                    ))
                })
                .map_err(|e| HelpdeskError::Storage(e.to_string()))?;

            let mut messages = Vec::new();
            for row in rows {
                let msg = row.map_err(|e| HelpdeskError::Storage(e.to_string()))?;
                messages.push(row_to_message(msg)?);
            }
            Ok(messages)
        })
    }
}

// =============================================================================
// ActionRepository
// =============================================================================

/// Repository for dispatched actions.
pub struct ActionRepository {
    db: Arc<Database>,
}

impl ActionRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Insert an action row.
    pub fn insert(&self, action: &ActionRecord) -> Result<(), HelpdeskError> {
        self.db.with_conn(|conn| insert_action(conn, action))
    }

    /// Insert an action row and apply a conversation status transition in
    /// one transaction (the standalone execute_action path).
    pub fn insert_with_status(
        &self,
        action: &ActionRecord,
        status_change: Option<ConversationStatus>,
    ) -> Result<(), HelpdeskError> {
        self.db.with_tx(|tx| {
            insert_action(tx, action)?;
            if let Some(status) = status_change {
                set_conversation_status(tx, action.conversation_id, status)?;
            }
            Ok(())
        })
    }

    /// Update an action's status.
    pub fn update_status(&self, id: Uuid, status: ActionStatus) -> Result<(), HelpdeskError> {
        self.db.with_conn(|conn| {
            conn.execute(
                "UPDATE actions SET status = ?1 WHERE id = ?2",
                rusqlite::params![status.to_string(), id.to_string()],
            )
            .map_err(|e| HelpdeskError::Storage(format!("Failed to update action status: {}", e)))?;
            Ok(())
        })
    }

    /// List all actions for a conversation, oldest first.
    pub fn list_by_conversation(
        &self,
        conversation_id: Uuid,
    ) -> Result<Vec<ActionRecord>, HelpdeskError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id, conversation_id, kind, params, status, reference, created_at
                     FROM actions
                     WHERE conversation_id = ?1
                     ORDER BY created_at ASC, rowid ASC",
                )
                .map_err(|e| HelpdeskError::Storage(e.to_string()))?;

            let rows = stmt
                .query_map(rusqlite::params![conversation_id.to_string()], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, Option<String>>(5)?,
                        row.get::<_, i64>(6)?,
                    ))
                })
                .map_err(|e| HelpdeskError::Storage(e.to_string()))?;

            let mut actions = Vec::new();
            for row in rows {
                let action = row.map_err(|e| HelpdeskError::Storage(e.to_string()))?;
                actions.push(row_to_action(action)?);
            }
            Ok(actions)
        })
    }

    /// Count all action rows for a conversation.
    pub fn count(&self, conversation_id: Uuid) -> Result<u64, HelpdeskError> {
        self.db.with_conn(|conn| {
            let count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM actions WHERE conversation_id = ?1",
                    rusqlite::params![conversation_id.to_string()],
                    |row| row.get(0),
                )
                .map_err(|e| HelpdeskError::Storage(e.to_string()))?;
            Ok(count as u64)
        })
    }
}

// =============================================================================
// DocumentRepository
// =============================================================================

/// Repository for knowledge-base documents and their fragments.
pub struct DocumentRepository {
    db: Arc<Database>,
}

impl DocumentRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Save a document and its fragments in one transaction.
    pub fn save(
        &self,
        filename: &str,
        fragment_texts: &[&str],
    ) -> Result<Document, HelpdeskError> {
        let document = Document {
            id: Uuid::new_v4(),
            filename: filename.to_string(),
            uploaded_at: Utc::now(),
        };

        self.db.with_tx(|tx| {
            tx.execute(
                "INSERT INTO documents (id, filename, uploaded_at) VALUES (?1, ?2, ?3)",
                rusqlite::params![
                    document.id.to_string(),
                    document.filename,
                    document.uploaded_at.timestamp(),
                ],
            )
            .map_err(|e| HelpdeskError::Storage(format!("Failed to save document: {}", e)))?;

            for text in fragment_texts {
                tx.execute(
                    "INSERT INTO fragments (id, document_id, text) VALUES (?1, ?2, ?3)",
                    rusqlite::params![Uuid::new_v4().to_string(), document.id.to_string(), text],
                )
                .map_err(|e| HelpdeskError::Storage(format!("Failed to save fragment: {}", e)))?;
            }
            Ok(())
        })?;

        Ok(document)
    }

    /// List documents that have not been soft-deleted, newest first.
    pub fn list(&self) -> Result<Vec<Document>, HelpdeskError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id, filename, uploaded_at FROM documents
                     WHERE deleted_at IS NULL
                     ORDER BY uploaded_at DESC",
                )
                .map_err(|e| HelpdeskError::Storage(e.to_string()))?;

            let rows = stmt
                .query_map([], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, i64>(2)?,
                    ))
                })
                .map_err(|e| HelpdeskError::Storage(e.to_string()))?;

            let mut documents = Vec::new();
            for row in rows {
                let (id, filename, uploaded_at) =
                    row.map_err(|e| HelpdeskError::Storage(e.to_string()))?;
                documents.push(Document {
                    id: parse_uuid(&id)?,
                    filename,
                    uploaded_at: epoch_to_utc(uploaded_at),
                });
            }
            Ok(documents)
        })
    }

    /// Soft-delete a document. Returns false when it was already gone.
    pub fn soft_delete(&self, id: Uuid) -> Result<bool, HelpdeskError> {
        self.db.with_conn(|conn| {
            let changed = conn
                .execute(
                    "UPDATE documents SET deleted_at = strftime('%s', 'now')
                     WHERE id = ?1 AND deleted_at IS NULL",
                    rusqlite::params![id.to_string()],
                )
                .map_err(|e| HelpdeskError::Storage(format!("Failed to delete document: {}", e)))?;
            Ok(changed > 0)
        })
    }

    /// Fetch a fragment by ID.
    pub fn fragment_by_id(&self, id: Uuid) -> Result<Option<KnowledgeFragment>, HelpdeskError> {
        self.db.with_conn(|conn| {
            let result = conn
                .query_row(
                    "SELECT id, document_id, text FROM fragments WHERE id = ?1",
                    rusqlite::params![id.to_string()],
                    |row| {
                        Ok((
                            row.get::<_, String>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, String>(2)?,
                        ))
                    },
                )
                .optional()
                .map_err(|e| HelpdeskError::Storage(e.to_string()))?;

            match result {
                Some((id, document_id, text)) => Ok(Some(KnowledgeFragment {
                    id: parse_uuid(&id)?,
                    document_id: parse_uuid(&document_id)?,
                    text,
                })),
                None => Ok(None),
            }
        })
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use helpdesk_core::types::ActionKind;

    fn setup() -> (
        Arc<Database>,
        ConversationRepository,
        MessageRepository,
        ActionRepository,
    ) {
        let db = Arc::new(Database::in_memory().unwrap());
        (
            Arc::clone(&db),
            ConversationRepository::new(Arc::clone(&db)),
            MessageRepository::new(Arc::clone(&db)),
            ActionRepository::new(db),
        )
    }

    fn message(conversation_id: Uuid, sender: Sender, text: &str) -> MessageRecord {
        MessageRecord {
            id: Uuid::new_v4(),
            conversation_id,
            sender,
            text: text.to_string(),
            timestamp: Utc::now(),
            source_fragment_id: None,
        }
    }

    fn action(conversation_id: Uuid, kind: ActionKind) -> ActionRecord {
        ActionRecord {
            id: Uuid::new_v4(),
            conversation_id,
            kind,
            params: serde_json::json!({}),
            status: ActionStatus::Completed,
            reference: Some("TKT-TEST0001".to_string()),
            created_at: Utc::now(),
        }
    }

    // ---- Conversations ----

    #[test]
    fn test_create_and_find_conversation() {
        let (_, conversations, _, _) = setup();
        let created = conversations
            .create("Ada", Some("ada@example.com"), "en")
            .unwrap();

        let found = conversations.find_by_id(created.id).unwrap().unwrap();
        assert_eq!(found.customer_name, "Ada");
        assert_eq!(found.customer_email.as_deref(), Some("ada@example.com"));
        assert_eq!(found.language, "en");
        assert_eq!(found.status, ConversationStatus::Active);
    }

    #[test]
    fn test_find_unknown_conversation() {
        let (_, conversations, _, _) = setup();
        assert!(conversations.find_by_id(Uuid::new_v4()).unwrap().is_none());
    }

    #[test]
    fn test_update_status() {
        let (_, conversations, _, _) = setup();
        let conv = conversations.create("Ada", None, "en").unwrap();

        conversations
            .update_status(conv.id, ConversationStatus::Escalated)
            .unwrap();
        let found = conversations.find_by_id(conv.id).unwrap().unwrap();
        assert_eq!(found.status, ConversationStatus::Escalated);
    }

    #[test]
    fn test_update_status_unknown_conversation_fails() {
        let (_, conversations, _, _) = setup();
        let result = conversations.update_status(Uuid::new_v4(), ConversationStatus::Resolved);
        assert!(result.is_err());
    }

    #[test]
    fn test_list_with_counts() {
        let (_, conversations, messages, _) = setup();
        let conv = conversations.create("Ada", None, "en").unwrap();
        messages
            .append(&message(conv.id, Sender::Customer, "hello"))
            .unwrap();
        messages
            .append(&message(conv.id, Sender::Ai, "hi there"))
            .unwrap();

        let summaries = conversations.list_with_counts().unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].message_count, 2);
    }

    // ---- Messages ----

    #[test]
    fn test_transcript_preserves_order() {
        let (_, conversations, messages, _) = setup();
        let conv = conversations.create("Ada", None, "en").unwrap();

        for i in 0..6 {
            let sender = if i % 2 == 0 { Sender::Customer } else { Sender::Ai };
            messages
                .append(&message(conv.id, sender, &format!("message {}", i)))
                .unwrap();
        }

        let transcript = messages.transcript(conv.id).unwrap();
        assert_eq!(transcript.len(), 6);
        for (i, msg) in transcript.iter().enumerate() {
            assert_eq!(msg.text, format!("message {}", i));
        }
    }

    #[test]
    fn test_recent_window_keeps_latest_in_order() {
        let (_, conversations, messages, _) = setup();
        let conv = conversations.create("Ada", None, "en").unwrap();

        for i in 0..10 {
            messages
                .append(&message(conv.id, Sender::Customer, &format!("m{}", i)))
                .unwrap();
        }

        let recent = messages.recent(conv.id, 4).unwrap();
        assert_eq!(recent.len(), 4);
        assert_eq!(recent[0].text, "m6");
        assert_eq!(recent[3].text, "m9");
    }

    #[test]
    fn test_message_with_fragment_reference() {
        let (db, conversations, messages, _) = setup();
        let conv = conversations.create("Ada", None, "en").unwrap();
        let documents = DocumentRepository::new(db);
        let doc = documents.save("manual.pdf", &["warranty text"]).unwrap();
        let fragment_id = first_fragment_id(&documents, doc.id);

        let mut msg = message(conv.id, Sender::Ai, "grounded reply");
        msg.source_fragment_id = Some(fragment_id);
        messages.append(&msg).unwrap();

        let transcript = messages.transcript(conv.id).unwrap();
        assert_eq!(transcript[0].source_fragment_id, Some(fragment_id));
    }

    fn first_fragment_id(documents: &DocumentRepository, document_id: Uuid) -> Uuid {
        documents
            .db
            .with_conn(|conn| {
                let id: String = conn
                    .query_row(
                        "SELECT id FROM fragments WHERE document_id = ?1 LIMIT 1",
                        rusqlite::params![document_id.to_string()],
                        |row| row.get(0),
                    )
                    .map_err(|e| HelpdeskError::Storage(e.to_string()))?;
                parse_uuid(&id)
            })
            .unwrap()
    }

    // ---- Actions ----

    #[test]
    fn test_insert_and_list_actions() {
        let (_, conversations, _, actions) = setup();
        let conv = conversations.create("Ada", None, "en").unwrap();

        actions.insert(&action(conv.id, ActionKind::CreateTicket)).unwrap();
        let listed = actions.list_by_conversation(conv.id).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].kind, ActionKind::CreateTicket);
        assert_eq!(listed[0].status, ActionStatus::Completed);
    }

    #[test]
    fn test_insert_with_status_flips_conversation() {
        let (_, conversations, _, actions) = setup();
        let conv = conversations.create("Ada", None, "en").unwrap();

        actions
            .insert_with_status(
                &action(conv.id, ActionKind::CreateTicket),
                Some(ConversationStatus::Escalated),
            )
            .unwrap();

        let found = conversations.find_by_id(conv.id).unwrap().unwrap();
        assert_eq!(found.status, ConversationStatus::Escalated);
        assert_eq!(actions.count(conv.id).unwrap(), 1);
    }

    #[test]
    fn test_replayed_action_creates_second_row() {
        // No dedup key exists; replay of the same payload appends a second
        // row. This pins the current behavior as a regression baseline.
        let (_, conversations, _, actions) = setup();
        let conv = conversations.create("Ada", None, "en").unwrap();

        let first = action(conv.id, ActionKind::ReturnProduct);
        let mut second = first.clone();
        second.id = Uuid::new_v4();

        actions.insert(&first).unwrap();
        actions.insert(&second).unwrap();
        assert_eq!(actions.count(conv.id).unwrap(), 2);
    }

    #[test]
    fn test_update_action_status() {
        let (_, conversations, _, actions) = setup();
        let conv = conversations.create("Ada", None, "en").unwrap();
        let mut record = action(conv.id, ActionKind::RequestCall);
        record.status = ActionStatus::Pending;
        actions.insert(&record).unwrap();

        actions.update_status(record.id, ActionStatus::Failed).unwrap();
        let listed = actions.list_by_conversation(conv.id).unwrap();
        assert_eq!(listed[0].status, ActionStatus::Failed);
    }

    // ---- Exchange transaction ----

    #[test]
    fn test_record_exchange_persists_all_parts() {
        let (_, conversations, messages, actions) = setup();
        let conv = conversations.create("Ada", None, "en").unwrap();

        let exchange = ExchangeRecord {
            customer_message: message(conv.id, Sender::Customer, "please escalate"),
            ai_message: message(conv.id, Sender::Ai, "ticket created"),
            action: Some(action(conv.id, ActionKind::CreateTicket)),
            status_change: Some(ConversationStatus::Escalated),
        };
        conversations.record_exchange(&exchange).unwrap();

        assert_eq!(messages.transcript(conv.id).unwrap().len(), 2);
        assert_eq!(actions.count(conv.id).unwrap(), 1);
        assert_eq!(
            conversations.find_by_id(conv.id).unwrap().unwrap().status,
            ConversationStatus::Escalated
        );
    }

    #[test]
    fn test_record_exchange_rolls_back_as_a_unit() {
        let (_, conversations, messages, actions) = setup();
        let conv = conversations.create("Ada", None, "en").unwrap();

        // An action against an unknown conversation violates the foreign key,
        // which must also discard the message pair.
        let exchange = ExchangeRecord {
            customer_message: message(conv.id, Sender::Customer, "hello"),
            ai_message: message(conv.id, Sender::Ai, "hi"),
            action: Some(action(Uuid::new_v4(), ActionKind::CreateTicket)),
            status_change: None,
        };
        assert!(conversations.record_exchange(&exchange).is_err());

        assert_eq!(messages.transcript(conv.id).unwrap().len(), 0);
        assert_eq!(actions.count(conv.id).unwrap(), 0);
    }

    #[test]
    fn test_record_exchange_without_action() {
        let (_, conversations, messages, actions) = setup();
        let conv = conversations.create("Ada", None, "en").unwrap();

        let exchange = ExchangeRecord {
            customer_message: message(conv.id, Sender::Customer, "what is the warranty?"),
            ai_message: message(conv.id, Sender::Ai, "12 months"),
            action: None,
            status_change: None,
        };
        conversations.record_exchange(&exchange).unwrap();

        assert_eq!(messages.transcript(conv.id).unwrap().len(), 2);
        assert_eq!(actions.count(conv.id).unwrap(), 0);
    }

    // ---- Documents ----

    #[test]
    fn test_save_and_list_documents() {
        let (db, _, _, _) = setup();
        let documents = DocumentRepository::new(db);
        documents.save("manual.pdf", &["part one", "part two"]).unwrap();

        let listed = documents.list().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].filename, "manual.pdf");
    }

    #[test]
    fn test_soft_delete_document() {
        let (db, _, _, _) = setup();
        let documents = DocumentRepository::new(db);
        let doc = documents.save("manual.pdf", &["text"]).unwrap();

        assert!(documents.soft_delete(doc.id).unwrap());
        assert!(documents.list().unwrap().is_empty());
        // Second delete is a no-op.
        assert!(!documents.soft_delete(doc.id).unwrap());
    }
}
