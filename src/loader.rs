//! PDF loading
//!
//! Pulls per-page text out of a PDF, cleans it, and derives the sentence and
//! chunk sequences for the document. A `Document` is built once and never
//! changes afterwards.

use crate::chunking::{normalize, sentences, Chunk, SentenceChunker};
use anyhow::{Context, Result};
use std::path::Path;

/// Produces raw text for each page of a document
pub trait PageExtractor: Send + Sync {
    /// Raw text per page, in page order. Pages may be empty.
    fn extract_pages(&self, path: &Path) -> Result<Vec<String>>;
}

/// Page extraction backed by `pdf-extract`
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfExtractor;

impl PdfExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract pages from an in-memory PDF
    pub fn extract_pages_from_mem(&self, bytes: &[u8]) -> Result<Vec<String>> {
        let text = pdf_extract::extract_text_from_mem(bytes)
            .map_err(|e| anyhow::anyhow!("PDF extraction failed: {}", e))?;
        Ok(split_pages(&text))
    }
}

impl PageExtractor for PdfExtractor {
    fn extract_pages(&self, path: &Path) -> Result<Vec<String>> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read PDF: {}", path.display()))?;
        self.extract_pages_from_mem(&bytes)
            .with_context(|| format!("Failed to extract text from {}", path.display()))
    }
}

/// pdf-extract returns one string with pages separated by form feeds
fn split_pages(text: &str) -> Vec<String> {
    text.split('\x0C').map(|page| page.to_string()).collect()
}

/// A loaded document with its derived sentences and chunks
#[derive(Debug, Clone)]
pub struct Document {
    /// Where the document came from (file path or caller-provided label)
    pub source: String,
    /// Number of pages the extractor returned, empty ones included
    pub page_count: usize,
    /// Cleaned, concatenated page text
    pub full_text: String,
    sentences: Vec<String>,
    chunks: Vec<Chunk>,
}

impl Document {
    /// Load a document from disk through the given extractor
    pub fn load(
        path: &Path,
        extractor: &dyn PageExtractor,
        chunker: &SentenceChunker,
    ) -> Result<Self> {
        let pages = extractor.extract_pages(path)?;
        Ok(Self::from_pages(path.display().to_string(), &pages, chunker))
    }

    /// Build a document from already-extracted page text
    pub fn from_pages<S: AsRef<str>>(
        source: impl Into<String>,
        pages: &[S],
        chunker: &SentenceChunker,
    ) -> Self {
        let source = source.into();
        let full_text = normalize::join_pages(pages);

        if full_text.is_empty() {
            tracing::warn!(source = %source, pages = pages.len(), "document contains no extractable text");
        }

        let sentences: Vec<String> = sentences::split_sentences(&full_text)
            .into_iter()
            .map(str::to_string)
            .collect();
        let chunks = chunker.chunk_sentences(&sentences);

        tracing::debug!(
            source = %source,
            pages = pages.len(),
            chars = full_text.chars().count(),
            sentences = sentences.len(),
            chunks = chunks.len(),
            "document chunked"
        );

        Self {
            source,
            page_count: pages.len(),
            full_text,
            sentences,
            chunks,
        }
    }

    pub fn sentences(&self) -> &[String] {
        &self.sentences
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// Chunk texts, in order, ready for embedding
    pub fn chunk_texts(&self) -> Vec<String> {
        self.chunks.iter().map(|c| c.text.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}
