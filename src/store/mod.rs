// Vector store seam: trait boundary plus the qdrant implementation
pub mod qdrant;

pub use qdrant::QdrantStore;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::collections::HashMap;

/// One (vector, payload) pair headed for the index
#[derive(Debug, Clone)]
pub struct VectorRecord {
    pub id: String,
    pub values: Vec<f32>,
    pub payload: HashMap<String, JsonValue>,
}

/// One similarity match coming back from the index.
///
/// The payload carries the evidence text and citation metadata stored
/// at index-build time; vector values are never returned.
#[derive(Debug, Clone)]
pub struct ScoredMatch {
    pub score: f32,
    pub payload: HashMap<String, JsonValue>,
}

/// Stores (vector, payload) pairs and answers nearest-neighbor queries.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert or overwrite records by id (idempotent for stable ids)
    async fn upsert(&self, records: Vec<VectorRecord>) -> Result<()>;

    /// Return up to `top_k` matches with payloads, best first
    async fn query(&self, vector: Vec<f32>, top_k: usize) -> Result<Vec<ScoredMatch>>;
}
