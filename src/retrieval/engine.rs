//! Retrieval engine composing embedder, vector store and ranking
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::sync::Arc;

use crate::config::RetrievalConfig;
use crate::embedding::Embedder;
use crate::retrieval::ranking::{rank_and_filter, Evidence, Match, MatchMetadata};
use crate::store::{ScoredMatch, VectorStore};

/// Query-time parameters for one retrieval
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalParams {
    /// Raw matches fetched from the vector store
    pub top_k: usize,
    /// Evidence-quality floor applied after retrieval
    pub min_score: f32,
    /// Maximum evidence items kept
    pub final_top_k: usize,
    /// Total character budget across evidence texts
    pub max_context_chars: usize,
    /// Per-evidence character cap
    pub per_chunk_char_cap: usize,
}

impl Default for RetrievalParams {
    fn default() -> Self {
        Self {
            top_k: 12,
            min_score: 0.50,
            final_top_k: 6,
            max_context_chars: 4500,
            per_chunk_char_cap: 900,
        }
    }
}

impl From<&RetrievalConfig> for RetrievalParams {
    fn from(config: &RetrievalConfig) -> Self {
        Self {
            top_k: config.top_k,
            min_score: config.min_score,
            final_top_k: config.final_top_k,
            max_context_chars: config.max_context_chars,
            per_chunk_char_cap: config.per_chunk_char_cap,
        }
    }
}

/// Retrieval engine: query text in, ranked evidence out.
///
/// Clients are injected so tests can substitute fakes; the engine holds
/// no other state and every retrieve call is independent.
pub struct RetrievalEngine {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    default_params: RetrievalParams,
}

impl RetrievalEngine {
    /// Create a new retrieval engine with default parameters
    pub fn new(embedder: Arc<dyn Embedder>, store: Arc<dyn VectorStore>) -> Self {
        Self {
            embedder,
            store,
            default_params: RetrievalParams::default(),
        }
    }

    /// Create with custom default parameters
    pub fn with_params(
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        params: RetrievalParams,
    ) -> Self {
        Self {
            embedder,
            store,
            default_params: params,
        }
    }

    /// Retrieve ranked evidence for a query
    pub async fn retrieve(&self, query: &str) -> Result<Vec<Evidence>> {
        self.retrieve_with_params(query, &self.default_params).await
    }

    /// Retrieve with custom parameters.
    ///
    /// A blank query returns an empty list without touching the
    /// embedder or the store. Embedder/store failures propagate
    /// unchanged; no retry is attempted here.
    pub async fn retrieve_with_params(
        &self,
        query: &str,
        params: &RetrievalParams,
    ) -> Result<Vec<Evidence>> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }

        let embeddings = self
            .embedder
            .embed(&[query.to_string()])
            .await
            .context("Failed to embed query")?;

        let vector = embeddings
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("Embedder returned no vector for query"))?;

        let raw = self
            .store
            .query(vector, params.top_k)
            .await
            .context("Failed to query vector store")?;

        let matches: Vec<Match> = raw.into_iter().map(match_from_scored).collect();

        Ok(rank_and_filter(
            matches,
            params.min_score,
            params.final_top_k,
            params.max_context_chars,
            params.per_chunk_char_cap,
        ))
    }

    /// Get default retrieval parameters
    pub fn default_params(&self) -> &RetrievalParams {
        &self.default_params
    }

    /// Update default retrieval parameters
    pub fn set_default_params(&mut self, params: RetrievalParams) {
        self.default_params = params;
    }
}

/// Map a raw store match into the typed shape, defaulting malformed
/// metadata instead of failing
fn match_from_scored(scored: ScoredMatch) -> Match {
    let text = payload_str(&scored.payload, "text").unwrap_or_default();
    let source = payload_str(&scored.payload, "source").unwrap_or_else(|| "unknown".to_string());
    let page = payload_int(&scored.payload, "page").unwrap_or(-1);

    Match {
        text,
        score: scored.score,
        metadata: MatchMetadata { source, page },
    }
}

fn payload_str(payload: &HashMap<String, JsonValue>, key: &str) -> Option<String> {
    payload.get(key).and_then(|v| v.as_str()).map(String::from)
}

fn payload_int(payload: &HashMap<String, JsonValue>, key: &str) -> Option<i64> {
    payload
        .get(key)
        .and_then(|v| v.as_i64().or_else(|| v.as_f64().map(|f| f as i64)))
}
