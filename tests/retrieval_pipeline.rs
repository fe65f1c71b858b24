//! End-to-end pipeline tests: ingest into an in-memory vector store,
//! retrieve through the engine, assemble citations.
//!
//! The embedder and store are deterministic fakes wired through the
//! same trait seams the real Ollama/qdrant clients use.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use citeline::citations::build_context;
use citeline::config::ChunkingConfig;
use citeline::embedding::Embedder;
use citeline::ingest::{Indexer, PageMetadata, PageUnit};
use citeline::retrieval::{RetrievalEngine, RetrievalParams};
use citeline::store::{ScoredMatch, VectorRecord, VectorStore};

/// Deterministic keyword-feature embedder: texts about the same topic
/// land close together under cosine similarity.
struct KeywordEmbedder {
    calls: AtomicUsize,
}

impl KeywordEmbedder {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }

    fn featurize(text: &str) -> Vec<f32> {
        let lower = text.to_lowercase();
        let heart = lower.matches("heart").count() as f32;
        let lung = lower.matches("lung").count() as f32;
        let v = vec![heart + 0.05, lung + 0.05, 0.05];
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        v.into_iter().map(|x| x / norm).collect()
    }
}

#[async_trait]
impl Embedder for KeywordEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts.iter().map(|t| Self::featurize(t)).collect())
    }

    fn dimension(&self) -> usize {
        3
    }
}

/// In-memory vector store with id-keyed upserts and cosine queries
struct InMemoryStore {
    records: Mutex<HashMap<String, VectorRecord>>,
}

impl InMemoryStore {
    fn new() -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
        }
    }

    fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let na: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let nb: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if na == 0.0 || nb == 0.0 {
        0.0
    } else {
        dot / (na * nb)
    }
}

#[async_trait]
impl VectorStore for InMemoryStore {
    async fn upsert(&self, records: Vec<VectorRecord>) -> Result<()> {
        let mut guard = self.records.lock().unwrap();
        for record in records {
            guard.insert(record.id.clone(), record);
        }
        Ok(())
    }

    async fn query(&self, vector: Vec<f32>, top_k: usize) -> Result<Vec<ScoredMatch>> {
        let guard = self.records.lock().unwrap();
        let mut scored: Vec<ScoredMatch> = guard
            .values()
            .map(|record| ScoredMatch {
                score: cosine(&vector, &record.values),
                payload: record.payload.clone(),
            })
            .collect();

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap());
        scored.truncate(top_k);
        Ok(scored)
    }
}

fn page(source: &str, page_no: i64, text: String) -> PageUnit {
    PageUnit {
        text,
        metadata: PageMetadata {
            source: source.to_string(),
            page: page_no,
            doc_type: "reference".to_string(),
            path: format!("/kb/{}", source),
        },
    }
}

fn knowledge_base() -> Vec<PageUnit> {
    vec![
        page(
            "cardio.md",
            1,
            "The heart pumps blood through the body. A healthy heart beats \
             in a steady rhythm, and heart rate rises under load. "
                .repeat(3),
        ),
        page(
            "pulmo.md",
            1,
            "The lungs exchange oxygen and carbon dioxide. Each lung is \
             divided into lobes, and lung capacity varies with fitness. "
                .repeat(3),
        ),
    ]
}

fn chunking() -> ChunkingConfig {
    ChunkingConfig {
        chunk_size: 120,
        overlap: 20,
        min_chunk_chars: 10,
    }
}

fn params() -> RetrievalParams {
    RetrievalParams {
        top_k: 12,
        min_score: 0.2,
        final_top_k: 6,
        max_context_chars: 4500,
        per_chunk_char_cap: 900,
    }
}

async fn seeded_store() -> (Arc<KeywordEmbedder>, Arc<InMemoryStore>) {
    let embedder = Arc::new(KeywordEmbedder::new());
    let store = Arc::new(InMemoryStore::new());

    let indexer = Indexer::new(embedder.clone(), store.clone(), 4);
    let report = indexer
        .index_pages(&knowledge_base(), &chunking(), None)
        .await
        .unwrap();
    assert!(report.chunks > 0);

    (embedder, store)
}

#[tokio::test]
async fn test_index_then_retrieve_end_to_end() {
    let (embedder, store) = seeded_store().await;
    let engine = RetrievalEngine::with_params(embedder, store, params());

    let evidence = engine.retrieve("how does the heart work?").await.unwrap();

    assert!(!evidence.is_empty());
    assert_eq!(evidence[0].metadata.source, "cardio.md");

    // At most one evidence item per (source, page)
    let mut seen = std::collections::HashSet::new();
    for item in &evidence {
        assert!(seen.insert((item.metadata.source.clone(), item.metadata.page)));
    }

    // Scores are sorted descending
    for pair in evidence.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
}

#[tokio::test]
async fn test_citations_stay_consistent_with_context_block() {
    let (embedder, store) = seeded_store().await;
    let engine = RetrievalEngine::with_params(embedder, store, params());

    let evidence = engine.retrieve("heart and lung function").await.unwrap();
    let (block, citations) = build_context(&evidence, 350);

    assert_eq!(citations.len(), evidence.len());
    for (i, citation) in citations.iter().enumerate() {
        assert_eq!(citation.cid, i + 1);
        assert!(block.contains(&format!(
            "[{}] Source: {} (page {})",
            citation.cid, citation.source, citation.page
        )));
    }

    let header_count = block
        .lines()
        .filter(|line| line.contains("] Source: "))
        .count();
    assert_eq!(header_count, citations.len());
}

#[tokio::test]
async fn test_reingestion_is_idempotent() {
    let (embedder, store) = seeded_store().await;
    let count_after_first = store.len();

    let indexer = Indexer::new(embedder, store.clone(), 4);
    indexer
        .index_pages(&knowledge_base(), &chunking(), None)
        .await
        .unwrap();

    assert_eq!(store.len(), count_after_first);
}

#[tokio::test]
async fn test_blank_query_never_reaches_the_embedder() {
    let (embedder, store) = seeded_store().await;
    let calls_after_indexing = embedder.calls.load(Ordering::SeqCst);

    let engine = RetrievalEngine::with_params(embedder.clone(), store, params());
    let evidence = engine.retrieve("   ").await.unwrap();

    assert!(evidence.is_empty());
    assert_eq!(embedder.calls.load(Ordering::SeqCst), calls_after_indexing);
}

#[tokio::test]
async fn test_empty_index_yields_empty_citations() {
    let embedder = Arc::new(KeywordEmbedder::new());
    let store = Arc::new(InMemoryStore::new());
    let engine = RetrievalEngine::with_params(embedder, store, params());

    let evidence = engine.retrieve("anything at all").await.unwrap();
    assert!(evidence.is_empty());

    let (block, citations) = build_context(&evidence, 350);
    assert_eq!(block, "");
    assert!(citations.is_empty());
}

#[tokio::test]
async fn test_threshold_filters_off_topic_evidence() {
    let (embedder, store) = seeded_store().await;

    let strict = RetrievalParams {
        min_score: 0.9,
        ..params()
    };
    let engine = RetrievalEngine::with_params(embedder, store, strict);

    let evidence = engine.retrieve("heart heart heart").await.unwrap();
    for item in &evidence {
        assert!(item.score >= 0.9);
        assert_eq!(item.metadata.source, "cardio.md");
    }
}
