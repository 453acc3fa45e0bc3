//! Notification side-channel.
//!
//! Notifications are best-effort: the action's contract to the customer is
//! "we recorded your request", so delivery failure is logged and never
//! affects the action's status.

use async_trait::async_trait;

/// Error from a notification delivery attempt.
#[derive(Debug, thiserror::Error)]
#[error("Notification failed: {0}")]
pub struct NotifyError(pub String);

/// A fire-and-forget notification channel toward the support team.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver an event with its payload. Failures are the caller's to log.
    async fn notify(&self, event: &str, payload: &serde_json::Value) -> Result<(), NotifyError>;
}

/// Notifier that records events in the process log only.
///
/// Used when no delivery channel is configured; also keeps the pipeline
/// observable in development.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier {
    recipient: Option<String>,
}

impl LogNotifier {
    pub fn new() -> Self {
        Self { recipient: None }
    }

    /// Log notifications addressed to the configured support inbox.
    pub fn with_recipient(recipient: impl Into<String>) -> Self {
        Self {
            recipient: Some(recipient.into()),
        }
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, event: &str, payload: &serde_json::Value) -> Result<(), NotifyError> {
        match self.recipient {
            Some(ref to) => {
                tracing::info!(event = %event, to = %to, payload = %payload, "Notification emitted")
            }
            None => tracing::info!(event = %event, payload = %payload, "Notification emitted"),
        }
        Ok(())
    }
}
