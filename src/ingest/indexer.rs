//! Batch ingestion: chunk, embed, upsert
//!
//! Processes chunks in fixed-size batches to bound peak memory and
//! request sizes. Point ids are derived deterministically from
//! (source, page, chunk_index) so re-running ingestion overwrites
//! vectors instead of duplicating them.

use anyhow::{Context, Result};
use indicatif::ProgressBar;
use serde_json::json;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::config::ChunkingConfig;
use crate::embedding::Embedder;
use crate::ingest::chunker::{chunk_documents, EvidenceChunk};
use crate::ingest::loader::PageUnit;
use crate::store::{VectorRecord, VectorStore};

/// Summary of one ingestion run
#[derive(Debug, Clone)]
pub struct IndexReport {
    pub pages: usize,
    pub chunks: usize,
}

/// Deterministic point id for a chunk location.
///
/// The digest is folded into a UUID because qdrant only accepts UUID or
/// integer point ids. Identical (source, page, chunk_index) always maps
/// to the same id.
pub fn stable_chunk_id(source: &str, page: i64, chunk_index: usize) -> String {
    let digest = Sha256::digest(format!("{}|p{}|c{}", source, page, chunk_index).as_bytes());
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&digest[..16]);
    Uuid::from_bytes(bytes).to_string()
}

/// Batch ingestion pipeline over an embedder and a vector store
pub struct Indexer {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    batch_size: usize,
}

impl Indexer {
    /// Create a new indexer
    pub fn new(embedder: Arc<dyn Embedder>, store: Arc<dyn VectorStore>, batch_size: usize) -> Self {
        Self {
            embedder,
            store,
            batch_size: batch_size.max(1),
        }
    }

    /// Chunk the given pages and upsert every chunk.
    ///
    /// Batches are independent; `progress`, when given, advances one
    /// tick per chunk.
    pub async fn index_pages(
        &self,
        pages: &[PageUnit],
        chunking: &ChunkingConfig,
        progress: Option<&ProgressBar>,
    ) -> Result<IndexReport> {
        let chunks = chunk_documents(
            pages,
            chunking.chunk_size,
            chunking.overlap,
            chunking.min_chunk_chars,
        );

        if let Some(pb) = progress {
            pb.set_length(chunks.len() as u64);
        }

        for batch in chunks.chunks(self.batch_size) {
            let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
            let vectors = self
                .embedder
                .embed(&texts)
                .await
                .context("Failed to generate batch embeddings")?;

            let records: Vec<VectorRecord> = batch
                .iter()
                .zip(vectors.into_iter())
                .map(|(chunk, values)| VectorRecord {
                    id: stable_chunk_id(
                        &chunk.metadata.source,
                        chunk.metadata.page,
                        chunk.metadata.chunk_index,
                    ),
                    values,
                    payload: chunk_payload(chunk),
                })
                .collect();

            self.store
                .upsert(records)
                .await
                .context("Failed to upsert batch")?;

            if let Some(pb) = progress {
                pb.inc(batch.len() as u64);
            }
        }

        Ok(IndexReport {
            pages: pages.len(),
            chunks: chunks.len(),
        })
    }
}

/// Payload stored with each vector. The chunk text rides along so that
/// query results can cite evidence without a second lookup.
fn chunk_payload(chunk: &EvidenceChunk) -> HashMap<String, serde_json::Value> {
    let mut payload = HashMap::new();
    payload.insert("source".to_string(), json!(chunk.metadata.source));
    payload.insert("page".to_string(), json!(chunk.metadata.page));
    payload.insert("doc_type".to_string(), json!(chunk.metadata.doc_type));
    payload.insert("path".to_string(), json!(chunk.metadata.path));
    payload.insert("chunk_index".to_string(), json!(chunk.metadata.chunk_index));
    payload.insert("chunk_size".to_string(), json!(chunk.metadata.chunk_size));
    payload.insert("overlap".to_string(), json!(chunk.metadata.overlap));
    payload.insert("text".to_string(), json!(chunk.text));
    payload
}
