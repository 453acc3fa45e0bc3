//! Intent classification.
//!
//! Maps a customer message onto the closed action set or nothing. Lexical
//! pattern matching runs first and is pure; when it finds nothing and a
//! completion provider is available, a constrained classification question
//! is asked and the answer mapped back onto the same closed set, defaulting
//! to no intent on anything unparseable.

pub mod patterns;

use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use helpdesk_core::types::ActionKind;
use helpdesk_completion::CompletionProvider;

use crate::intent::patterns::PatternSet;

/// Which branch of the classifier produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassifierOrigin {
    /// Keyword/pattern match; deterministic.
    Lexical,
    /// Model-assisted fallback answer.
    Model,
}

/// A classified intent, tagged with its origin and the matched evidence.
#[derive(Debug, Clone, Serialize)]
pub struct ClassifiedIntent {
    pub intent: ActionKind,
    pub origin: ClassifierOrigin,
    /// The matched pattern text (lexical) or the model's raw answer line.
    pub matched: String,
}

static INTENT_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)INTENT:\s*(\w+)").unwrap());

/// Classifier over the closed action set.
#[derive(Debug, Default, Clone)]
pub struct IntentClassifier;

impl IntentClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Deterministic lexical classification. Pure, no I/O.
    pub fn classify(&self, text: &str) -> Option<ClassifiedIntent> {
        PatternSet::shared()
            .first_match(text)
            .map(|(intent, matched)| ClassifiedIntent {
                intent,
                origin: ClassifierOrigin::Lexical,
                matched,
            })
    }

    /// Lexical classification with a model-assisted fallback.
    ///
    /// A provider failure or an answer outside the closed set both resolve
    /// to no intent; classification never propagates provider errors.
    pub async fn classify_with_fallback(
        &self,
        text: &str,
        provider: &dyn CompletionProvider,
    ) -> Option<ClassifiedIntent> {
        if let Some(classified) = self.classify(text) {
            return Some(classified);
        }

        let prompt = classification_prompt(text);
        let reply = match provider.complete(&prompt).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::debug!(error = %e, "Model-assisted classification unavailable");
                return None;
            }
        };

        parse_intent_reply(&reply).map(|intent| ClassifiedIntent {
            intent,
            origin: ClassifierOrigin::Model,
            matched: reply.lines().next().unwrap_or_default().to_string(),
        })
    }
}

/// Build the constrained classification question for the model fallback.
fn classification_prompt(text: &str) -> String {
    format!(
        "Analyze this customer message and determine their intent.\n\
         \n\
         Message: \"{}\"\n\
         \n\
         Classify the intent as ONE of:\n\
         - create_ticket: the customer has a complex issue needing human support\n\
         - return_product: the customer wants to return or exchange a product\n\
         - request_call: the customer wants to be called back by the support team\n\
         - general_query: a general question or support request\n\
         \n\
         Respond with exactly one line in this format:\n\
         INTENT: <intent>",
        text
    )
}

/// Map the model's answer onto the closed set; anything else is no intent.
fn parse_intent_reply(reply: &str) -> Option<ActionKind> {
    let captures = INTENT_LINE_RE.captures(reply)?;
    ActionKind::from_str(&captures[1].to_lowercase()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use helpdesk_completion::CompletionError;

    struct FixedProvider(&'static str);

    #[async_trait]
    impl CompletionProvider for FixedProvider {
        async fn complete(&self, _prompt: &str) -> Result<String, CompletionError> {
            Ok(self.0.to_string())
        }
    }

    struct DownProvider;

    #[async_trait]
    impl CompletionProvider for DownProvider {
        async fn complete(&self, _prompt: &str) -> Result<String, CompletionError> {
            Err(CompletionError::Unavailable("down".to_string()))
        }
    }

    // ---- Lexical path ----

    #[test]
    fn test_lexical_classification_is_tagged() {
        let classifier = IntentClassifier::new();
        let classified = classifier.classify("I want a refund").unwrap();
        assert_eq!(classified.intent, ActionKind::ReturnProduct);
        assert_eq!(classified.origin, ClassifierOrigin::Lexical);
        assert_eq!(classified.matched, "refund");
    }

    #[test]
    fn test_lexical_none_for_general_query() {
        let classifier = IntentClassifier::new();
        assert!(classifier.classify("what is the warranty period").is_none());
    }

    // ---- Model fallback path ----

    #[tokio::test]
    async fn test_fallback_skipped_when_lexical_matches() {
        let classifier = IntentClassifier::new();
        // The provider would answer create_ticket; lexical must win first.
        let classified = classifier
            .classify_with_fallback("refund please", &FixedProvider("INTENT: create_ticket"))
            .await
            .unwrap();
        assert_eq!(classified.intent, ActionKind::ReturnProduct);
        assert_eq!(classified.origin, ClassifierOrigin::Lexical);
    }

    #[tokio::test]
    async fn test_fallback_maps_model_answer() {
        let classifier = IntentClassifier::new();
        let classified = classifier
            .classify_with_fallback(
                "my package never arrived and I am unhappy",
                &FixedProvider("INTENT: create_ticket"),
            )
            .await
            .unwrap();
        assert_eq!(classified.intent, ActionKind::CreateTicket);
        assert_eq!(classified.origin, ClassifierOrigin::Model);
    }

    #[tokio::test]
    async fn test_fallback_general_query_is_none() {
        let classifier = IntentClassifier::new();
        let result = classifier
            .classify_with_fallback("hello there", &FixedProvider("INTENT: general_query"))
            .await;
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_fallback_unparseable_answer_is_none() {
        let classifier = IntentClassifier::new();
        for answer in ["no idea", "", "INTENT: escalate_to_mars", "intent create_ticket"] {
            let result = classifier
                .classify_with_fallback("hello there", &FixedProvider(answer))
                .await;
            assert!(result.is_none(), "answer {:?} must map to none", answer);
        }
    }

    #[tokio::test]
    async fn test_fallback_provider_failure_is_none() {
        let classifier = IntentClassifier::new();
        let result = classifier
            .classify_with_fallback("hello there", &DownProvider)
            .await;
        assert!(result.is_none());
    }

    // ---- Answer parsing ----

    #[test]
    fn test_parse_intent_reply_case_insensitive() {
        assert_eq!(
            parse_intent_reply("intent: RETURN_PRODUCT"),
            Some(ActionKind::ReturnProduct)
        );
    }

    #[test]
    fn test_parse_intent_reply_ignores_surrounding_text() {
        let reply = "Sure! Here is my analysis.\nINTENT: request_call\nCONFIDENCE: high";
        assert_eq!(parse_intent_reply(reply), Some(ActionKind::RequestCall));
    }

    #[test]
    fn test_classification_prompt_contains_message_and_set() {
        let prompt = classification_prompt("where is my order");
        assert!(prompt.contains("where is my order"));
        for kind in ["create_ticket", "return_product", "request_call", "general_query"] {
            assert!(prompt.contains(kind));
        }
    }
}
