//! Retrieval and answering over an in-memory document, with stub providers
//! standing in for the neural models.

use anyhow::Result;
use async_trait::async_trait;
use pdfrag::llm::provider::ModelMetadata;
use pdfrag::llm::types::{CompletionResponse, Message, Role, Usage};
use pdfrag::{
    ChunkConfig, Config, Document, EmbeddingProvider, LLMProvider, OverlapPolicy, ProgressTracker,
    SearchEngine, SentenceChunker, Session,
};
use std::sync::{Arc, Mutex};

const VOCAB: [&str; 4] = ["cat", "happy", "sun", "warm"];

/// Counts vocabulary words; texts sharing words land close together
struct KeywordEmbedder;

impl EmbeddingProvider for KeywordEmbedder {
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|text| {
                let text = text.to_lowercase();
                VOCAB.iter().map(|word| text.matches(word).count() as f32).collect()
            })
            .collect())
    }

    fn dimension(&self) -> usize {
        VOCAB.len()
    }
}

/// Returns one vector too few
struct ShortEmbedder;

impl EmbeddingProvider for ShortEmbedder {
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(vec![vec![0.0; 4]; texts.len().saturating_sub(1)])
    }

    fn dimension(&self) -> usize {
        4
    }
}

/// Echoes the user prompt back and remembers what it was sent
#[derive(Default)]
struct EchoProvider {
    seen: Mutex<Vec<Message>>,
}

#[async_trait]
impl LLMProvider for EchoProvider {
    fn metadata(&self) -> ModelMetadata {
        ModelMetadata {
            id: "echo".to_string(),
            context_window: 4096,
            encoder_decoder: false,
        }
    }

    fn count_tokens(&self, text: &str) -> Result<usize> {
        Ok(text.split_whitespace().count())
    }

    async fn completion(&self, messages: &[Message]) -> Result<CompletionResponse> {
        self.seen.lock().unwrap().extend_from_slice(messages);
        let prompt = messages.last().map(|m| m.content.clone()).unwrap_or_default();
        Ok(CompletionResponse {
            content: prompt,
            usage: Usage::new(10, 5),
        })
    }
}

fn config() -> Config {
    Config {
        chunking: ChunkConfig::new(25, OverlapPolicy::SentenceCount { count: 0 }),
        ..Config::default()
    }
}

fn session_for(pages: &[&str], embedder: Arc<dyn EmbeddingProvider>) -> Result<Session> {
    let config = config();
    let chunker = SentenceChunker::new(config.chunking)?;
    let document = Document::from_pages("cat.pdf", pages, &chunker);
    Session::build(document, &config, embedder, &mut ProgressTracker::quiet())
}

fn cat_session() -> Session {
    session_for(&["A cat sat. It was happy.", "The sun was warm today."], Arc::new(KeywordEmbedder)).unwrap()
}

#[test]
fn test_session_indexes_every_chunk() {
    let session = cat_session();
    let chunks: Vec<&str> = session.document().chunks().iter().map(|c| c.text.as_str()).collect();
    assert_eq!(chunks, vec!["A cat sat. It was happy.", "The sun was warm today."]);
    assert_eq!(session.top_k(), 3);
}

#[test]
fn test_retrieve_closest_chunk_first() {
    let session = cat_session();

    let results = session.retrieve("Was the sun warm?", 1).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].chunk_index, 1);
    assert_eq!(results[0].content, "The sun was warm today.");
    assert_eq!(results[0].distance, 0.0);
}

#[test]
fn test_retrieve_clamps_k_and_orders_by_distance() {
    let session = cat_session();

    let results = session.retrieve("happy cat", 10).unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].chunk_index, 0);
    assert!(results[0].distance <= results[1].distance);
}

#[test]
fn test_distance_cutoff_drops_far_chunks() {
    let session = cat_session().with_search_engine(SearchEngine::with_max_distance(1.0));
    let results = session.retrieve("warm sun", 5).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].chunk_index, 1);
}

#[test]
fn test_embedder_vector_count_mismatch_fails() {
    let result = session_for(&["A cat sat. It was happy.", "The sun was warm today."], Arc::new(ShortEmbedder));
    assert!(result.is_err());
}

#[tokio::test]
async fn test_ask_sends_retrieved_context() {
    let session = cat_session();
    let generator = EchoProvider::default();

    let answer = session.ask("Was the sun warm?", &generator).await.unwrap();

    assert_eq!(answer.question, "Was the sun warm?");
    assert_eq!(answer.sources.len(), 2);
    assert_eq!(answer.sources[0].content, "The sun was warm today.");
    assert_eq!(answer.usage.total_tokens, 15);

    // Closest chunk comes first in the prompt
    let prompt = &answer.answer;
    assert!(prompt.contains("Question: Was the sun warm?"));
    let sun = prompt.find("The sun was warm today.").unwrap();
    let cat = prompt.find("A cat sat.").unwrap();
    assert!(sun < cat);

    let seen = generator.seen.lock().unwrap();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0].role, Role::System);
    assert_eq!(seen[1].role, Role::User);
}

#[tokio::test]
async fn test_ask_on_empty_document_fails() {
    let session = session_for(&["", "  "], Arc::new(KeywordEmbedder)).unwrap();
    assert!(session.document().is_empty());
    assert!(session.retrieve("anything", 3).unwrap().is_empty());

    let generator = EchoProvider::default();
    assert!(session.ask("anything?", &generator).await.is_err());
    assert!(generator.seen.lock().unwrap().is_empty());
}
