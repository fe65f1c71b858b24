//! Citation assembly
//!
//! Turns a ranked evidence list into two positionally consistent views:
//! a context block for the model and numbered citation lines for the
//! reader. Citation ids are recomputed per query; they have no identity
//! across queries.

use serde::{Deserialize, Serialize};

use crate::retrieval::ranking::{truncate_chars, Evidence};

/// A numbered, display-ready reference to one evidence item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Citation {
    /// 1-based position in the evidence list
    pub cid: usize,
    pub source: String,
    pub page: i64,
    pub score: f32,
    pub snippet: String,
}

/// Build the model-facing context block and the citation list from the
/// same ordering.
///
/// Each context entry is a `[n] Source: ... (page ...)` header followed
/// by the snippet; entries are separated by blank lines. An empty
/// evidence list yields an empty block and no citations, never
/// placeholders.
pub fn build_context(evidence: &[Evidence], max_snippet_chars: usize) -> (String, Vec<Citation>) {
    let mut citations = Vec::new();
    let mut context_parts = Vec::new();

    for (i, item) in evidence.iter().enumerate() {
        let cid = i + 1;
        let text = item.text.trim();
        let snippet = truncate_chars(text, max_snippet_chars).trim().to_string();

        context_parts.push(format!(
            "[{}] Source: {} (page {})\n{}\n",
            cid, item.metadata.source, item.metadata.page, snippet
        ));

        citations.push(Citation {
            cid,
            source: item.metadata.source.clone(),
            page: item.metadata.page,
            score: item.score,
            snippet,
        });
    }

    let context_block = context_parts.join("\n").trim().to_string();
    (context_block, citations)
}

/// Human-facing citation display lines, one per citation
pub fn citations_to_display_lines(citations: &[Citation]) -> Vec<String> {
    citations
        .iter()
        .map(|c| {
            format!(
                "[{}] {} — page {} (score: {:.3})",
                c.cid, c.source, c.page, c.score
            )
        })
        .collect()
}
