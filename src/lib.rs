//! pdfrag - question answering over a single PDF
//!
//! Pipeline: extract page text, clean it, split it into sentences, pack the
//! sentences into overlapping chunks, embed and index the chunks, then
//! answer questions from the closest chunks.

pub mod chunking;
pub mod config;
pub mod embed;
pub mod error;
pub mod index;
pub mod init;
pub mod llm;
pub mod loader;
pub mod pipeline;
pub mod repl;
pub mod search;
pub mod session;

pub use chunking::{Chunk, ChunkConfig, OverlapPolicy, SentenceChunker};
pub use config::{Config, DevicePreference, EmbeddingModel, GenerationBackend};
pub use embed::{Embedder, EmbeddingProvider};
pub use error::ChunkError;
pub use index::{FlatIndex, Neighbor};
pub use init::{run_init, InitResult};
pub use llm::{LLMProvider, OpenAIProvider, T5Provider};
pub use loader::{Document, PageExtractor, PdfExtractor};
pub use pipeline::ProgressTracker;
pub use search::{SearchEngine, SearchResult};
pub use session::{Answer, Session};
