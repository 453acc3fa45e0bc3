//! SQLite persistence for Helpdesk.
//!
//! Provides the database wrapper, schema migrations, repositories for
//! conversations, messages, actions, and documents, and the FTS5-backed
//! knowledge fragment search.

pub mod db;
pub mod migrations;
pub mod repository;
pub mod search;

pub use db::Database;
pub use repository::{
    ActionRepository, ConversationRepository, ConversationSummary, DocumentRepository,
    ExchangeRecord, MessageRepository,
};
pub use search::{extract_keywords, FragmentHit, FragmentSearch};
