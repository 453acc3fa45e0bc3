//! Completion provider capability for Helpdesk.
//!
//! Defines the `CompletionProvider` trait consumed by the conversation
//! orchestrator and the intent classifier, an HTTP client for the Gemini
//! generateContent API, and a deterministic offline provider used when no
//! API key is configured.

pub mod gemini;
pub mod offline;
pub mod provider;

pub use gemini::GeminiClient;
pub use offline::OfflineProvider;
pub use provider::{CompletionError, CompletionProvider};
