//! Question-answering session over one document
//!
//! A session owns everything derived from a loaded PDF: the chunked
//! document, the chunk embeddings and the index over them, plus a shared
//! handle to the embedding provider. It is built once and never mutated;
//! loading another document means building another session. The answer
//! generator is passed to each question, so one model can serve many
//! sessions.

use crate::chunking::SentenceChunker;
use crate::config::Config;
use crate::embed::EmbeddingProvider;
use crate::index::FlatIndex;
use crate::llm::context::WindowManager;
use crate::llm::provider::LLMProvider;
use crate::llm::types::Usage;
use crate::loader::{Document, PageExtractor};
use crate::pipeline::{ProgressTracker, EMBED_BATCH_SIZE};
use crate::search::{SearchEngine, SearchResult};
use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;

/// An answer and the chunks it was generated from
#[derive(Debug, Clone)]
pub struct Answer {
    pub question: String,
    pub answer: String,
    pub sources: Vec<SearchResult>,
    pub usage: Usage,
}

pub struct Session {
    document: Document,
    index: FlatIndex,
    embedder: Arc<dyn EmbeddingProvider>,
    search: SearchEngine,
    top_k: usize,
    answer_tokens: usize,
}

impl Session {
    /// Extract, chunk, embed and index a PDF
    pub fn load(
        path: &Path,
        config: &Config,
        extractor: &dyn PageExtractor,
        embedder: Arc<dyn EmbeddingProvider>,
        progress: &mut ProgressTracker,
    ) -> Result<Self> {
        let chunker = SentenceChunker::new(config.chunking)?;

        progress.start_phase("Extracting text");
        let pages = extractor.extract_pages(path)?;
        progress.set_pages(pages.len());

        progress.start_phase("Chunking");
        let document = Document::from_pages(path.display().to_string(), &pages, &chunker);

        Self::build(document, config, embedder, progress)
    }

    /// Embed and index an already-chunked document
    pub fn build(
        document: Document,
        config: &Config,
        embedder: Arc<dyn EmbeddingProvider>,
        progress: &mut ProgressTracker,
    ) -> Result<Self> {
        progress.start_phase("Embedding chunks");
        let texts = document.chunk_texts();
        let mut index = FlatIndex::new(embedder.dimension());

        for batch in texts.chunks(EMBED_BATCH_SIZE) {
            let vectors = embedder.embed_batch(batch).context("Failed to embed chunks")?;
            if vectors.len() != batch.len() {
                anyhow::bail!(
                    "Embedding provider returned {} vectors for {} chunks",
                    vectors.len(),
                    batch.len()
                );
            }
            index.add(&vectors)?;
            progress.update_chunks(batch.len());
        }
        progress.complete();

        tracing::info!(
            source = %document.source,
            chunks = index.len(),
            dimensions = index.dimension(),
            "session ready"
        );

        Ok(Self {
            document,
            index,
            embedder,
            search: SearchEngine::new(),
            top_k: config.retrieval.top_k,
            answer_tokens: config.retrieval.answer_tokens,
        })
    }

    /// Replace the result filter (e.g. to add a distance cutoff)
    pub fn with_search_engine(mut self, search: SearchEngine) -> Self {
        self.search = search;
        self
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// The `k` chunks closest to the question, closest first
    pub fn retrieve(&self, question: &str, k: usize) -> Result<Vec<SearchResult>> {
        if self.index.is_empty() {
            return Ok(Vec::new());
        }

        let query = self.embedder.embed(question).context("Failed to embed question")?;
        let hits = self.index.search(&query, k)?;
        let results = self.search.resolve(&hits, self.document.chunks());

        tracing::debug!(k, hits = results.len(), "retrieved chunks");
        Ok(results)
    }

    /// Retrieve context for a question and have `generator` answer it
    pub async fn ask(&self, question: &str, generator: &dyn LLMProvider) -> Result<Answer> {
        if self.document.is_empty() {
            anyhow::bail!("Document contains no text: {}", self.document.source);
        }

        let sources = self.retrieve(question, self.top_k)?;
        let context: Vec<String> = sources.iter().map(|s| s.content.clone()).collect();

        let window = WindowManager::for_provider(generator, self.answer_tokens);
        let messages = window.build_messages(generator, question, &context)?;

        let response = generator
            .completion(&messages)
            .await
            .context("Answer generation failed")?;

        Ok(Answer {
            question: question.to_string(),
            answer: response.content,
            sources,
            usage: response.usage,
        })
    }
}
