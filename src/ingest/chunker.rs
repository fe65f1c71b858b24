//! Character-window chunking
//!
//! Splits page-level units into overlapping fixed-size character
//! windows. Character-based chunking is predictable across document
//! formats; window boundaries ignore word and sentence structure.

use serde::{Deserialize, Serialize};

use crate::ingest::loader::PageUnit;

/// Metadata stamped onto every evidence chunk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub source: String,
    pub page: i64,
    pub doc_type: String,
    pub path: String,
    pub chunk_index: usize,
    pub chunk_size: usize,
    pub overlap: usize,
}

/// An addressable evidence unit derived from exactly one page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceChunk {
    pub text: String,
    pub metadata: ChunkMetadata,
}

/// Slide a window of `chunk_size` characters across `text`, advancing
/// `chunk_size - overlap` per step (clamped to at least 1 so a bad
/// overlap can never stall the loop). Windows are trimmed; windows that
/// are empty after trimming are dropped. The final window may be
/// shorter than `chunk_size` and ends exactly at text end.
pub fn chunk_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    if text.is_empty() || chunk_size == 0 {
        return Vec::new();
    }

    let chars: Vec<char> = text.chars().collect();
    let n = chars.len();
    let step = chunk_size.saturating_sub(overlap).max(1);

    let mut chunks = Vec::new();
    let mut start = 0;

    while start < n {
        let end = (start + chunk_size).min(n);
        let window: String = chars[start..end].iter().collect();
        let trimmed = window.trim();
        if !trimmed.is_empty() {
            chunks.push(trimmed.to_string());
        }

        if end == n {
            break;
        }
        start += step;
    }

    chunks
}

/// Convert page-level units into evidence chunks.
///
/// Windows shorter than `min_chunk_chars` are discarded; surviving
/// windows get a 0-based `chunk_index` (contiguous within their page)
/// plus the owning page's metadata. Identical input always yields an
/// identical ordered sequence.
pub fn chunk_documents(
    pages: &[PageUnit],
    chunk_size: usize,
    overlap: usize,
    min_chunk_chars: usize,
) -> Vec<EvidenceChunk> {
    let mut all_chunks = Vec::new();

    for page in pages {
        let pieces = chunk_text(&page.text, chunk_size, overlap);

        let mut chunk_index = 0;
        for piece in pieces {
            if piece.chars().count() < min_chunk_chars {
                continue;
            }

            all_chunks.push(EvidenceChunk {
                text: piece,
                metadata: ChunkMetadata {
                    source: page.metadata.source.clone(),
                    page: page.metadata.page,
                    doc_type: page.metadata.doc_type.clone(),
                    path: page.metadata.path.clone(),
                    chunk_index,
                    chunk_size,
                    overlap,
                },
            });
            chunk_index += 1;
        }
    }

    all_chunks
}
