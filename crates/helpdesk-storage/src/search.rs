//! Knowledge fragment retrieval.
//!
//! Extracts keywords from raw customer text and searches the `fragments_fts`
//! virtual table, returning results ranked by BM25 relevance. Retrieval
//! favors precision: a small top-N and a total character budget bound the
//! context handed to the completion prompt.

use std::sync::Arc;

use uuid::Uuid;

use helpdesk_core::error::HelpdeskError;

use crate::db::Database;

/// Words carrying no retrieval signal, filtered before the FTS query.
const STOP_WORDS: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "your", "yours",
    "yourself", "yourselves", "he", "him", "his", "himself", "she", "her", "hers", "herself",
    "it", "its", "itself", "they", "them", "their", "theirs", "themselves", "what", "which",
    "who", "whom", "this", "that", "these", "those", "am", "is", "are", "was", "were", "be",
    "been", "being", "have", "has", "had", "having", "do", "does", "did", "doing", "a", "an",
    "the", "and", "but", "if", "or", "because", "as", "until", "while", "of", "at", "by",
    "for", "with", "about", "against", "between", "into", "through", "during", "before",
    "after", "above", "below", "to", "from", "up", "down", "in", "out", "on", "off", "over",
    "under", "again", "further", "then", "once", "can", "will", "just", "should", "now",
    "how", "where", "when",
];

/// Maximum keywords fed into a single FTS query.
const MAX_KEYWORDS: usize = 5;

/// Minimum characters left in the budget for a truncated trailing fragment.
const MIN_TRUNCATED_CHARS: usize = 500;

/// Extract up to [`MAX_KEYWORDS`] search keywords from raw message text.
///
/// Lower-cases, strips non-alphanumeric characters, drops stop words and
/// tokens of fewer than three characters, and de-duplicates while preserving
/// first-seen order.
pub fn extract_keywords(text: &str) -> Vec<String> {
    let mut keywords: Vec<String> = Vec::new();

    for word in text.to_lowercase().split_whitespace() {
        let clean: String = word.chars().filter(|c| c.is_alphanumeric()).collect();
        if clean.len() <= 2 || STOP_WORDS.contains(&clean.as_str()) {
            continue;
        }
        if !keywords.contains(&clean) {
            keywords.push(clean);
        }
        if keywords.len() == MAX_KEYWORDS {
            break;
        }
    }

    keywords
}

/// A single fragment retrieval result.
#[derive(Debug, Clone)]
pub struct FragmentHit {
    pub id: Uuid,
    pub document_id: Uuid,
    /// Filename of the source document, for customer-facing attribution.
    pub filename: String,
    pub text: String,
    /// BM25 relevance score (higher = more relevant).
    pub rank: f64,
}

/// Keyword search over knowledge fragments, backed by FTS5.
pub struct FragmentSearch {
    db: Arc<Database>,
}

impl FragmentSearch {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Retrieve the fragments most relevant to a raw customer message.
    ///
    /// Returns at most `top_n` fragments within `char_budget` total
    /// characters; the trailing fragment is truncated when only a meaningful
    /// remainder fits. No keywords or no matches yields an empty result,
    /// which is not an error.
    pub fn retrieve(
        &self,
        message_text: &str,
        top_n: u64,
        char_budget: usize,
    ) -> Result<Vec<FragmentHit>, HelpdeskError> {
        let keywords = extract_keywords(message_text);
        if keywords.is_empty() {
            return Ok(Vec::new());
        }

        let query = keywords
            .iter()
            .map(|k| format!("\"{}\"", k))
            .collect::<Vec<_>>()
            .join(" OR ");

        let mut hits = self.search(&query, top_n)?;
        apply_char_budget(&mut hits, char_budget);
        Ok(hits)
    }

    /// Search fragments with a raw FTS5 query, ranked by BM25.
    pub fn search(&self, query: &str, limit: u64) -> Result<Vec<FragmentHit>, HelpdeskError> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }

        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT f.id, f.document_id, d.filename, f.text, rank
                     FROM fragments_fts
                     JOIN fragments f ON f.rowid = fragments_fts.rowid
                     JOIN documents d ON d.id = f.document_id
                     WHERE fragments_fts MATCH ?1 AND d.deleted_at IS NULL
                     ORDER BY rank
                     LIMIT ?2",
                )
                .map_err(|e| HelpdeskError::Search(format!("FTS5 query prepare failed: {}", e)))?;

            let rows = stmt
                .query_map(rusqlite::params![query, limit], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, f64>(4)?,
                    ))
                })
                .map_err(|e| HelpdeskError::Search(format!("FTS5 query failed: {}", e)))?;

            let mut hits = Vec::new();
            for row in rows {
                let (id, document_id, filename, text, rank) =
                    row.map_err(|e| HelpdeskError::Search(e.to_string()))?;

                hits.push(FragmentHit {
                    id: Uuid::parse_str(&id)
                        .map_err(|e| HelpdeskError::Search(format!("Invalid UUID: {}", e)))?,
                    document_id: Uuid::parse_str(&document_id)
                        .map_err(|e| HelpdeskError::Search(format!("Invalid UUID: {}", e)))?,
                    filename,
                    text,
                    // FTS5 rank is negative (lower = better), negate for consistency.
                    rank: -rank,
                });
            }

            Ok(hits)
        })
    }
}

/// Trim the hit list to a total character budget.
///
/// Whole fragments are kept while they fit; the first fragment that does not
/// fit is truncated if a meaningful remainder is available, and everything
/// after it is dropped.
fn apply_char_budget(hits: &mut Vec<FragmentHit>, char_budget: usize) {
    let mut used = 0usize;
    let mut keep = 0usize;

    for hit in hits.iter_mut() {
        let len = hit.text.chars().count();
        if used + len <= char_budget {
            used += len;
            keep += 1;
            continue;
        }

        let remaining = char_budget.saturating_sub(used);
        if remaining >= MIN_TRUNCATED_CHARS {
            hit.text = hit.text.chars().take(remaining).collect();
            keep += 1;
        }
        break;
    }

    hits.truncate(keep);
}
