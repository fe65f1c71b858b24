//! Knowledge-base loading
//!
//! Walks a folder of .txt/.md documents and produces page-level units
//! with citation metadata. PDF text extraction happens upstream of this
//! crate; extracted pages land here as plain text files.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::errors::{RagError, Result};

/// Citation metadata carried by a page-level unit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageMetadata {
    pub source: String,
    pub page: i64,
    pub doc_type: String,
    pub path: String,
}

/// A page-level text unit with metadata (pre-chunking)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageUnit {
    pub text: String,
    pub metadata: PageMetadata,
}

/// Light cleanup for embedding and prompting: strip NULs, collapse whitespace
pub fn clean_text(text: &str) -> String {
    text.replace('\0', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Load .txt and .md files from a folder into page-level units.
///
/// Each file becomes one unit (page 1) with source, doc_type and path
/// metadata. Files shorter than `min_chars` after cleanup are skipped,
/// they are usually headers or reference stubs.
pub fn load_text_folder(
    folder: &Path,
    doc_type: &str,
    min_chars: usize,
) -> Result<Vec<PageUnit>> {
    if !folder.exists() {
        return Err(RagError::KnowledgeBase(format!(
            "Knowledge base folder not found: {}",
            folder.display()
        )));
    }

    let mut files: Vec<_> = std::fs::read_dir(folder)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            matches!(
                path.extension().and_then(|e| e.to_str()),
                Some("txt") | Some("md")
            )
        })
        .collect();
    files.sort();

    let mut pages = Vec::new();

    for file_path in files {
        let raw = std::fs::read(&file_path)?;
        let text = clean_text(&String::from_utf8_lossy(&raw));

        if text.chars().count() < min_chars {
            continue;
        }

        let source = file_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "unknown".to_string());

        pages.push(PageUnit {
            text,
            metadata: PageMetadata {
                source,
                page: 1,
                doc_type: doc_type.to_string(),
                path: file_path.to_string_lossy().into_owned(),
            },
        });
    }

    Ok(pages)
}

/// Load the whole knowledge base, failing if it yields no documents.
pub fn load_knowledge_base(
    folder: &Path,
    doc_type: &str,
    min_chars: usize,
) -> Result<Vec<PageUnit>> {
    let pages = load_text_folder(folder, doc_type, min_chars)?;

    if pages.is_empty() {
        return Err(RagError::KnowledgeBase(format!(
            "No documents found in: {}",
            folder.display()
        )));
    }

    Ok(pages)
}
