//! Prompt assembly and degraded-mode replies.
//!
//! The prompt layers, in order: the system instruction (persona, grounding
//! rules, action-detection instruction, target language), the retrieved
//! knowledge fragments, the trailing window of prior messages, and the new
//! customer message. Older history beyond the window is dropped, not
//! summarized, to bound prompt size.

use helpdesk_core::config::ChatConfig;
use helpdesk_core::types::{Conversation, MessageRecord, Sender};
use helpdesk_storage::FragmentHit;

/// Marker ahead of the retrieved-fragment section.
pub const KNOWLEDGE_MARKER: &str = "=== KNOWLEDGE BASE ===";

/// Marker ahead of the conversation history section.
pub const HISTORY_MARKER: &str = "=== CONVERSATION HISTORY ===";

/// Line used when retrieval found nothing.
const NO_CONTEXT_LINE: &str = "No specific document context available.";

/// Map a conversation language tag to the name used in prompt instructions.
fn language_name(tag: &str) -> &'static str {
    match tag {
        "hi" => "Hindi",
        "te" => "Telugu",
        _ => "English",
    }
}

/// Static apology used when the completion provider fails both attempts.
pub fn fallback_reply(language: &str) -> &'static str {
    match language {
        "hi" => "मुझे खेद है, लेकिन मुझे अभी आपके अनुरोध को संसाधित करने में परेशानी हो रही है। क्या आप कृपया पुनः प्रयास कर सकते हैं?",
        "te" => "క్షమించండి, కానీ నేను ప్రస్తుతం మీ అభ్యర్థనను ప్రాసెస్ చేయడంలో ఇబ్బంది పడుతున్నాను. దయచేసి మళ్లీ ప్రయత్నించగలరా?",
        _ => "I apologize, but I'm having trouble processing your request right now. Could you please try again?",
    }
}

/// Assembles completion prompts from conversation state.
pub struct PromptBuilder {
    history_turns: usize,
}

impl PromptBuilder {
    pub fn new(config: &ChatConfig) -> Self {
        Self {
            history_turns: config.history_turns,
        }
    }

    /// Build the full prompt for one customer message.
    ///
    /// `history` is the transcript window already bounded by the caller;
    /// only the trailing `history_turns` entries are rendered.
    pub fn build(
        &self,
        conversation: &Conversation,
        fragments: &[FragmentHit],
        history: &[MessageRecord],
        new_message: &str,
    ) -> String {
        let language = language_name(&conversation.language);
        let mut prompt = String::new();

        prompt.push_str(&format!(
            "You are a friendly and helpful AI customer support assistant.\n\
             \n\
             CRITICAL RULES:\n\
             - ONLY answer questions based on the knowledge base provided\n\
             - If information is NOT in the knowledge base, say \"I don't have that \
             information in my knowledge base\"\n\
             - NEVER make up or guess information\n\
             - If the customer wants to return a product, open a support ticket, or \
             request a callback, say so explicitly\n\
             - Keep responses concise (2-3 sentences usually)\n\
             - Respond ONLY in {}\n",
            language
        ));

        prompt.push('\n');
        prompt.push_str(KNOWLEDGE_MARKER);
        prompt.push('\n');
        if fragments.is_empty() {
            prompt.push_str(NO_CONTEXT_LINE);
            prompt.push('\n');
        } else {
            for fragment in fragments {
                prompt.push_str(&format!("Document: {}\n{}\n---\n", fragment.filename, fragment.text));
            }
        }

        let window_start = history.len().saturating_sub(self.history_turns);
        let window = &history[window_start..];
        if !window.is_empty() {
            prompt.push('\n');
            prompt.push_str(HISTORY_MARKER);
            prompt.push('\n');
            for msg in window {
                let label = match msg.sender {
                    Sender::Customer => "CUSTOMER",
                    Sender::Ai => "AI",
                };
                prompt.push_str(&format!("{}: {}\n", label, msg.text));
            }
        }

        prompt.push_str(&format!(
            "\nCUSTOMER: {}\n\nProvide a helpful response in {}:",
            new_message, language
        ));

        prompt
    }
}
