//! Configuration management for citeline
//!
//! Provides TOML-based configuration with defaults and validation.
//! Location: ~/.citeline/config.toml
//!
//! Every tunable of the retrieval pipeline lives here so call sites
//! never carry their own defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::errors::{RagError, Result};

/// Complete configuration for citeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub ollama: OllamaConfig,
    pub qdrant: QdrantConfig,
    pub chunking: ChunkingConfig,
    pub retrieval: RetrievalConfig,
    pub ingest: IngestConfig,
}

/// Ollama embedding service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    pub host: String,
    pub port: u16,
    pub embed_model: String,
    pub embed_dimension: usize,
}

/// Qdrant vector store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QdrantConfig {
    pub url: String,
    pub collection: String,
}

/// Character-window chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub overlap: usize,
    pub min_chunk_chars: usize,
}

/// Query-time retrieval and context-budget configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Raw matches fetched from the vector store per query
    pub top_k: usize,
    /// Evidence-quality floor; calibrated for cosine similarity
    pub min_score: f32,
    /// Maximum evidence items kept after ranking
    pub final_top_k: usize,
    /// Total character budget across all evidence texts
    pub max_context_chars: usize,
    /// Per-evidence character cap
    pub per_chunk_char_cap: usize,
    /// Character cap for citation snippets
    pub max_snippet_chars: usize,
    /// Fewest evidence items the ask command will answer from
    pub min_evidence: usize,
}

/// Knowledge-base ingestion configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    pub kb_folder: String,
    pub doc_type: String,
    pub min_page_chars: usize,
    pub batch_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ollama: OllamaConfig::default(),
            qdrant: QdrantConfig::default(),
            chunking: ChunkingConfig::default(),
            retrieval: RetrievalConfig::default(),
            ingest: IngestConfig::default(),
        }
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 11434,
            embed_model: "nomic-embed-text".to_string(),
            embed_dimension: 768,
        }
    }
}

impl Default for QdrantConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:6334".to_string(),
            collection: "knowledge_base".to_string(),
        }
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            overlap: 150,
            min_chunk_chars: 200,
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 12,
            min_score: 0.50,
            final_top_k: 6,
            max_context_chars: 4500,
            per_chunk_char_cap: 900,
            max_snippet_chars: 350,
            min_evidence: 2,
        }
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            kb_folder: "data/knowledge_base".to_string(),
            doc_type: "reference".to_string(),
            min_page_chars: 200,
            batch_size: 64,
        }
    }
}

impl Config {
    /// Load configuration from file or use defaults
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        if let Some(config_path) = path {
            Self::load_from_file(&config_path)
        } else {
            Self::load_default()
        }
    }

    /// Load configuration from specific file
    pub fn load_from_file(path: &PathBuf) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| RagError::Config(format!("Failed to read config: {}", e)))?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| RagError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Load default configuration from standard location or use built-in defaults
    pub fn load_default() -> Result<Self> {
        if let Some(home) = dirs::home_dir() {
            let config_path = home.join(".citeline").join("config.toml");
            if config_path.exists() {
                return Self::load_from_file(&config_path);
            }
        }

        Ok(Config::default())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.chunking.chunk_size == 0 {
            return Err(RagError::Config(
                "chunk_size must be greater than 0".to_string(),
            ));
        }

        if self.chunking.overlap >= self.chunking.chunk_size {
            return Err(RagError::Config(
                "overlap must be less than chunk_size".to_string(),
            ));
        }

        if self.retrieval.final_top_k == 0 {
            return Err(RagError::Config(
                "final_top_k must be greater than 0".to_string(),
            ));
        }

        if self.retrieval.per_chunk_char_cap > self.retrieval.max_context_chars {
            return Err(RagError::Config(
                "per_chunk_char_cap must not exceed max_context_chars".to_string(),
            ));
        }

        if self.ingest.batch_size == 0 {
            return Err(RagError::Config(
                "batch_size must be greater than 0".to_string(),
            ));
        }

        if self.ollama.embed_dimension == 0 {
            return Err(RagError::Config(
                "embed_dimension must be greater than 0".to_string(),
            ));
        }

        // min_score is intentionally not range-checked: similarity scores
        // are an opaque comparable value whose range depends on the metric.

        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self, path: &PathBuf) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| RagError::Config(format!("Failed to serialize config: {}", e)))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| RagError::Config(format!("Failed to create config dir: {}", e)))?;
        }

        std::fs::write(path, contents)
            .map_err(|e| RagError::Config(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    /// Get Ollama base URL
    pub fn ollama_url(&self) -> String {
        format!("http://{}:{}", self.ollama.host, self.ollama.port)
    }

    /// Expand tilde in paths
    pub fn expand_path(path: &str) -> PathBuf {
        if path.starts_with("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(&path[2..]);
            }
        }
        PathBuf::from(path)
    }

    /// Get knowledge-base folder path
    pub fn kb_folder(&self) -> PathBuf {
        Self::expand_path(&self.ingest.kb_folder)
    }
}
