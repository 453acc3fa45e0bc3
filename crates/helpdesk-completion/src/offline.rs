//! Deterministic offline completion provider.
//!
//! Stands in for the live provider when no API key is configured, so the
//! pipeline stays fully exercisable on a disconnected machine. Replies are
//! derived only from the prompt text: when a knowledge-base section is
//! present its first content line is echoed back, otherwise the provider
//! admits it has nothing and offers escalation.

use async_trait::async_trait;

use crate::provider::{CompletionError, CompletionProvider};

/// Marker emitted by the prompt builder ahead of retrieved fragments.
const KNOWLEDGE_MARKER: &str = "=== KNOWLEDGE BASE ===";

/// Keyless, network-free completion provider.
#[derive(Debug, Default, Clone)]
pub struct OfflineProvider;

impl OfflineProvider {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CompletionProvider for OfflineProvider {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        if let Some(section) = prompt.split(KNOWLEDGE_MARKER).nth(1) {
            let line = section
                .lines()
                .map(str::trim)
                .find(|l| !l.is_empty() && !l.starts_with("Document:") && !l.starts_with("==="));
            if let Some(line) = line {
                return Ok(format!("Based on our documentation: {}", line));
            }
        }

        Ok(
            "I don't have that information in my knowledge base. Would you like me to \
             create a support ticket so a human can help?"
                .to_string(),
        )
    }
}
