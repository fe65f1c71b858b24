// Ingestion pipeline: load pages, chunk them, embed and upsert
//
// Components:
// - Loader: knowledge-base folder to page-level units
// - Chunker: pages to overlapping character-window evidence chunks
// - Indexer: batched embed + upsert with stable point ids

pub mod chunker;
pub mod indexer;
pub mod loader;

pub use chunker::{chunk_documents, chunk_text, ChunkMetadata, EvidenceChunk};
pub use indexer::{stable_chunk_id, IndexReport, Indexer};
pub use loader::{clean_text, load_knowledge_base, load_text_folder, PageMetadata, PageUnit};
