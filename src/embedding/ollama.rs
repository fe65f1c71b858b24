//! Ollama embedding client
//!
//! Low-level HTTP client for the Ollama /api/embed endpoint. The same
//! client serves index-time batch embedding and query-time single-text
//! embedding.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::embedding::Embedder;

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

/// HTTP embedder backed by a local Ollama instance
pub struct OllamaEmbedder {
    client: Client,
    base_url: String,
    model: String,
    dimension: usize,
}

impl OllamaEmbedder {
    /// Create a new Ollama embedder
    ///
    /// # Arguments
    /// * `base_url` - Base URL for the Ollama API (e.g. http://127.0.0.1:11434)
    /// * `model` - Embedding model name (e.g. "nomic-embed-text")
    /// * `dimension` - Vector dimension the model produces
    pub fn new(base_url: String, model: String, dimension: usize) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url,
            model,
            dimension,
        }
    }

    /// Check that the Ollama service is reachable
    pub async fn health(&self) -> Result<()> {
        let url = format!("{}/api/tags", self.base_url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to connect to Ollama")?;

        if !response.status().is_success() {
            return Err(anyhow!("Ollama API error: {}", response.status()));
        }

        Ok(())
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/api/embed", self.base_url);
        let request = EmbedRequest {
            model: &self.model,
            input: texts,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .context("Failed to connect to Ollama")?;

        if !response.status().is_success() {
            return Err(anyhow!("Ollama API error: {}", response.status()));
        }

        let parsed: EmbedResponse = response
            .json()
            .await
            .context("Failed to parse embedding response")?;

        if parsed.embeddings.len() != texts.len() {
            return Err(anyhow!(
                "Embedding count mismatch: sent {} texts, got {} vectors",
                texts.len(),
                parsed.embeddings.len()
            ));
        }

        Ok(parsed.embeddings)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
