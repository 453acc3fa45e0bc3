//! Lexical intent pattern sets.
//!
//! One compiled regex set per action kind, evaluated in priority order:
//! CreateTicket beats ReturnProduct beats RequestCall when several sets
//! match the same message (over-escalating is cheaper than missing a
//! request for human help).

use std::sync::LazyLock;

use regex::Regex;

use helpdesk_core::types::ActionKind;

/// A single compiled pattern linked to an action kind.
pub struct IntentPattern {
    pub regex: Regex,
    pub kind: ActionKind,
}

/// All lexical patterns, compiled once and evaluated in priority order.
pub struct PatternSet {
    patterns: Vec<IntentPattern>,
}

static PATTERNS: LazyLock<PatternSet> = LazyLock::new(PatternSet::compile);

impl PatternSet {
    /// The shared, lazily compiled pattern set.
    pub fn shared() -> &'static PatternSet {
        &PATTERNS
    }

    fn compile() -> Self {
        let mut patterns = Vec::new();

        let mut add = |pats: &[&str], kind: ActionKind| {
            for pat in pats {
                patterns.push(IntentPattern {
                    regex: Regex::new(pat).expect("Invalid intent regex"),
                    kind,
                });
            }
        };

        // Escalation / ticket patterns. Highest priority.
        add(
            &[
                r"(?i)\b(?:speak|talk)\s+(?:to|with)\s+(?:a\s+)?(?:human|agent|person|representative|someone)\b",
                r"(?i)\bhuman\s+support\b",
                r"(?i)\bescalate\b",
                r"(?i)\b(?:create|open|file|raise)\s+(?:a\s+)?(?:support\s+)?ticket\b",
                r"(?i)\bsupport\s+ticket\b",
                r"(?i)\bfile\s+a\s+complaint\b",
                r"(?i)\bcomplaint\b",
                r"(?i)\bsupervisor\b",
                r"(?i)\bnot\s+(?:been\s+)?resolved\b",
                r"(?i)\bstill\s+(?:broken|not\s+working)\b",
                r"(?i)\breal\s+person\b",
            ],
            ActionKind::CreateTicket,
        );

        // Return / refund patterns.
        add(
            &[
                r"(?i)\breturn\b",
                r"(?i)\brefund\b",
                r"(?i)\bexchange\s+(?:it|this|the|my)\b",
                r"(?i)\bmoney\s+back\b",
                r"(?i)\bsend\s+(?:it|this)\s+back\b",
                r"(?i)\brma\b",
            ],
            ActionKind::ReturnProduct,
        );

        // Callback patterns.
        add(
            &[
                r"(?i)\bcall\s+me\b",
                r"(?i)\bcall\s*back\b",
                r"(?i)\bcallback\b",
                r"(?i)\bphone\s+call\b",
                r"(?i)\bgive\s+me\s+a\s+call\b",
                r"(?i)\bring\s+me\b",
                r"(?i)\b(?:speak|talk)\s+on\s+the\s+phone\b",
            ],
            ActionKind::RequestCall,
        );

        Self { patterns }
    }

    /// Return the highest-priority kind whose pattern matches, with the
    /// matched text. Patterns are stored in priority order, so the first
    /// match wins regardless of where it occurs in the message.
    pub fn first_match(&self, text: &str) -> Option<(ActionKind, String)> {
        for pattern in &self.patterns {
            if let Some(m) = pattern.regex.find(text) {
                return Some((pattern.kind, m.as_str().to_string()));
            }
        }
        None
    }
}
