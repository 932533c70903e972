//! The Provider Abstraction.
//!
//! Any backend that can turn a prompt into an answer: the OpenAI API or a
//! local T5 model.

use anyhow::Result;
use async_trait::async_trait;
use super::types::{CompletionResponse, Message};

/// Metadata about a model's capabilities.
#[derive(Debug, Clone)]
pub struct ModelMetadata {
    pub id: String,
    /// Maximum tokens the model accepts
    pub context_window: usize,
    /// Encoder-decoder models (T5) generate outside the input window, so
    /// `context_window` bounds the prompt alone
    pub encoder_decoder: bool,
}

#[async_trait]
pub trait LLMProvider: Send + Sync {
    fn metadata(&self) -> ModelMetadata;

    /// Estimate the number of tokens in a string.
    /// Used to fit retrieved chunks into the context window.
    fn count_tokens(&self, text: &str) -> Result<usize>;

    /// Send a chat completion request.
    async fn completion(&self, messages: &[Message]) -> Result<CompletionResponse>;
}
