//! Database schema migrations.
//!
//! Applies the initial schema: documents, fragments (plus the FTS5 mirror),
//! conversations, messages, actions, and the schema_migrations table.

use rusqlite::Connection;
use tracing::info;

use helpdesk_core::error::HelpdeskError;

/// Run all pending database migrations.
///
/// Currently implements the initial schema (version 1). Future migrations
/// can be added by checking the current version and applying incremental changes.
pub fn run_migrations(conn: &Connection) -> Result<(), HelpdeskError> {
    // Create the migrations tracking table first.
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version     INTEGER PRIMARY KEY NOT NULL,
            name        TEXT NOT NULL,
            applied_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );",
    )
    .map_err(|e| HelpdeskError::Storage(format!("Failed to create migrations table: {}", e)))?;

    let current_version: i64 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .map_err(|e| HelpdeskError::Storage(format!("Failed to query migration version: {}", e)))?;

    if current_version < 1 {
        apply_v1(conn)?;
        info!("Applied migration v1: initial_schema");
    }

    Ok(())
}

/// Version 1: Initial schema.
fn apply_v1(conn: &Connection) -> Result<(), HelpdeskError> {
    conn.execute_batch(
        "
        -- Knowledge-base documents (soft-deletable).
        CREATE TABLE IF NOT EXISTS documents (
            id              TEXT PRIMARY KEY NOT NULL,
            filename        TEXT NOT NULL,
            uploaded_at     INTEGER NOT NULL DEFAULT (strftime('%s', 'now')),
            deleted_at      INTEGER
        );

        -- Retrievable fragments of ingested document content.
        CREATE TABLE IF NOT EXISTS fragments (
            id              TEXT PRIMARY KEY NOT NULL,
            document_id     TEXT NOT NULL,
            text            TEXT NOT NULL DEFAULT '',
            FOREIGN KEY (document_id) REFERENCES documents(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_fragments_document
            ON fragments (document_id);

        -- FTS5 mirror of fragment text, kept in sync by triggers.
        CREATE VIRTUAL TABLE IF NOT EXISTS fragments_fts USING fts5(
            text,
            content='fragments',
            content_rowid='rowid'
        );

        CREATE TRIGGER IF NOT EXISTS fragments_ai AFTER INSERT ON fragments BEGIN
            INSERT INTO fragments_fts (rowid, text) VALUES (new.rowid, new.text);
        END;

        CREATE TRIGGER IF NOT EXISTS fragments_ad AFTER DELETE ON fragments BEGIN
            INSERT INTO fragments_fts (fragments_fts, rowid, text)
                VALUES ('delete', old.rowid, old.text);
        END;

        -- Customer conversations.
        CREATE TABLE IF NOT EXISTS conversations (
            id              TEXT PRIMARY KEY NOT NULL,
            customer_name   TEXT NOT NULL,
            customer_email  TEXT,
            language        TEXT NOT NULL DEFAULT 'en',
            started_at      INTEGER NOT NULL,
            status          TEXT NOT NULL DEFAULT 'active'
                            CHECK (status IN ('active', 'resolved', 'escalated'))
        );

        CREATE INDEX IF NOT EXISTS idx_conversations_started
            ON conversations (started_at DESC);

        -- Append-only conversation transcript.
        CREATE TABLE IF NOT EXISTS messages (
            id                  TEXT PRIMARY KEY NOT NULL,
            conversation_id     TEXT NOT NULL,
            sender              TEXT NOT NULL
                                CHECK (sender IN ('customer', 'ai')),
            text                TEXT NOT NULL,
            timestamp           INTEGER NOT NULL,
            source_fragment_id  TEXT,
            FOREIGN KEY (conversation_id) REFERENCES conversations(id)
        );

        CREATE INDEX IF NOT EXISTS idx_messages_conversation
            ON messages (conversation_id, timestamp ASC);

        -- Dispatched actions.
        CREATE TABLE IF NOT EXISTS actions (
            id              TEXT PRIMARY KEY NOT NULL,
            conversation_id TEXT NOT NULL,
            kind            TEXT NOT NULL
                            CHECK (kind IN ('create_ticket', 'return_product', 'request_call')),
            params          TEXT NOT NULL DEFAULT '{}',
            status          TEXT NOT NULL DEFAULT 'pending'
                            CHECK (status IN ('pending', 'completed', 'failed')),
            reference       TEXT,
            created_at      INTEGER NOT NULL,
            FOREIGN KEY (conversation_id) REFERENCES conversations(id)
        );

        CREATE INDEX IF NOT EXISTS idx_actions_conversation
            ON actions (conversation_id, created_at ASC);

        INSERT INTO schema_migrations (version, name) VALUES (1, 'initial_schema');
        ",
    )
    .map_err(|e| HelpdeskError::Storage(format!("Failed to apply v1 migration: {}", e)))?;

    Ok(())
}
