//! Context Window Management.
//!
//! Fits retrieved chunks and the user's question into the model's token
//! budget and assembles the final prompt. Chunks arrive ranked best first;
//! when the budget runs out the lowest-ranked ones are dropped.

use anyhow::Result;
use super::provider::LLMProvider;
use super::types::Message;

pub const SYSTEM_PROMPT: &str = "Answer the question using only the context below. \
If the context does not contain the answer, say that you don't know.";

/// Manages the context window for a single question.
pub struct WindowManager {
    /// Maximum number of tokens the model accepts.
    pub context_limit: usize,
    /// Tokens reserved for the answer.
    pub output_buffer: usize,
}

impl WindowManager {
    pub fn new(context_limit: usize, output_buffer: usize) -> Self {
        Self {
            context_limit,
            output_buffer,
        }
    }

    /// Window sized from the provider's own metadata.
    ///
    /// `output_buffer` is only reserved when the answer shares the prompt's
    /// window; encoder-decoder models get the whole window for the prompt.
    pub fn for_provider(provider: &dyn LLMProvider, output_buffer: usize) -> Self {
        let metadata = provider.metadata();
        let output_buffer = if metadata.encoder_decoder { 0 } else { output_buffer };
        Self::new(metadata.context_window, output_buffer)
    }

    /// Tokens left for retrieved chunks.
    ///
    /// available = context_limit - output_buffer - system_prompt - question prompt
    pub fn available_tokens_for_context(
        &self,
        provider: &dyn LLMProvider,
        system_prompt: &str,
        question: &str,
    ) -> Result<usize> {
        let system_tokens = provider.count_tokens(system_prompt)?;
        let question_tokens = provider.count_tokens(&user_prompt("", question))?;

        let used = system_tokens + question_tokens + self.output_buffer;
        Ok(self.context_limit.saturating_sub(used))
    }

    /// Keep chunks in rank order while they fit in `budget` tokens.
    ///
    /// If even the best chunk does not fit, it is truncated to the budget so
    /// the model always sees some context.
    pub fn fit_chunks(
        &self,
        provider: &dyn LLMProvider,
        chunks: &[String],
        budget: usize,
    ) -> Result<Vec<String>> {
        let mut kept = Vec::new();
        let mut used = 0;

        for chunk in chunks {
            // +1 for the blank line between chunks
            let cost = provider.count_tokens(chunk)? + 1;
            if used + cost > budget {
                if kept.is_empty() && budget > 1 {
                    let truncated = self.truncate(provider, chunk, budget - 1)?;
                    if !truncated.is_empty() {
                        kept.push(truncated);
                    }
                }
                break;
            }
            used += cost;
            kept.push(chunk.clone());
        }

        if kept.len() < chunks.len() {
            tracing::debug!(kept = kept.len(), retrieved = chunks.len(), budget, "context trimmed to fit window");
        }
        Ok(kept)
    }

    /// Longest character prefix of `text` within `max_tokens`.
    pub fn truncate(&self, provider: &dyn LLMProvider, text: &str, max_tokens: usize) -> Result<String> {
        if provider.count_tokens(text)? <= max_tokens {
            return Ok(text.to_string());
        }

        let boundaries: Vec<usize> = text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .collect();

        // Binary search over character counts; token counts grow with length
        let (mut lo, mut hi) = (0, boundaries.len() - 1);
        while lo < hi {
            let mid = (lo + hi + 1) / 2;
            if provider.count_tokens(&text[..boundaries[mid]])? <= max_tokens {
                lo = mid;
            } else {
                hi = mid - 1;
            }
        }

        Ok(text[..boundaries[lo]].trim_end().to_string())
    }

    /// System + user messages for a question and its retrieved chunks
    pub fn build_messages(
        &self,
        provider: &dyn LLMProvider,
        question: &str,
        chunks: &[String],
    ) -> Result<Vec<Message>> {
        let budget = self.available_tokens_for_context(provider, SYSTEM_PROMPT, question)?;
        let context = self.fit_chunks(provider, chunks, budget)?;

        Ok(vec![
            Message::system(SYSTEM_PROMPT),
            Message::user(user_prompt(&context.join("\n\n"), question)),
        ])
    }
}

fn user_prompt(context: &str, question: &str) -> String {
    format!("Context:\n{}\n\nQuestion: {}\nAnswer:", context, question.trim())
}
