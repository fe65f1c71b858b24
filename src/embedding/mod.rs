// Embedding seam: one trait, injected wherever text becomes vectors
pub mod ollama;

pub use ollama::OllamaEmbedder;

use anyhow::Result;
use async_trait::async_trait;

/// Maps text to fixed-dimension vectors, at both indexing and query time.
///
/// Implementations must return exactly one vector per input text, in
/// input order, and an empty output for an empty input.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Vector dimension produced by this embedder
    fn dimension(&self) -> usize;
}
