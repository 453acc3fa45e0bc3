//! The completion provider trait and its error type.

use async_trait::async_trait;

/// Errors from a completion provider call.
///
/// The orchestrator treats every variant the same way — one bounded retry,
/// then degrade to the static fallback reply — but the variants keep logs
/// and tests precise about what actually failed.
#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    #[error("Completion provider unavailable: {0}")]
    Unavailable(String),
    #[error("Completion request timed out after {0} seconds")]
    Timeout(u64),
    #[error("Completion response was malformed: {0}")]
    Malformed(String),
}

/// An opaque, possibly-failing text completion capability.
///
/// The single `complete` method keeps the seam narrow so deterministic fakes
/// can replace a live provider in tests without a network dependency.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Complete the given prompt, returning the provider's free-text reply.
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError>;
}
