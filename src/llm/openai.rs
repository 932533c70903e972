//! OpenAI API Provider.
//!
//! Implements the `LLMProvider` trait for OpenAI's Chat Completions API.

use super::provider::{LLMProvider, ModelMetadata};
use super::types::{CompletionResponse, Message, Role, Usage};
use crate::config::GenerationConfig;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

pub const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";

pub struct OpenAIProvider {
    client: Client,
    api_key: String,
    model: String,
    url: String,
    temperature: f64,
    top_p: f64,
    max_tokens: usize,
}

impl OpenAIProvider {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            model,
            url: OPENAI_API_URL.to_string(),
            temperature: 0.7,
            top_p: 0.9,
            max_tokens: 512,
        }
    }

    /// Provider using the model, endpoint and sampling settings from `[generation]`
    pub fn from_config(api_key: String, config: &GenerationConfig) -> Self {
        Self {
            temperature: config.temperature,
            top_p: config.top_p,
            max_tokens: config.max_new_tokens,
            ..Self::new(api_key, config.openai_model.clone())
        }
        .with_url(config.openai_base_url.clone())
    }

    /// Point at an OpenAI-compatible endpoint instead of api.openai.com
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    fn request(&self, messages: &[Message]) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: messages.iter().map(ApiMessage::from).collect(),
            temperature: self.temperature,
            top_p: self.top_p,
            max_tokens: self.max_tokens,
        }
    }
}

#[async_trait]
impl LLMProvider for OpenAIProvider {
    fn metadata(&self) -> ModelMetadata {
        let window = match self.model.as_str() {
            m if m.starts_with("gpt-4o") || m.starts_with("gpt-4-turbo") => 128_000,
            "gpt-4" => 8_192,
            "gpt-3.5-turbo" => 16_385,
            _ => 4_096, // Default safe assumption
        };

        ModelMetadata {
            id: self.model.clone(),
            context_window: window,
            encoder_decoder: false,
        }
    }

    fn count_tokens(&self, text: &str) -> Result<usize> {
        // Rule of thumb: 1 token ~= 4 characters
        Ok(text.chars().count().div_ceil(4))
    }

    async fn completion(&self, messages: &[Message]) -> Result<CompletionResponse> {
        let request = self.request(messages);
        tracing::debug!(model = %self.model, messages = messages.len(), "sending chat completion");

        let response = self.client
            .post(&self.url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .context("Failed to send request to OpenAI")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("OpenAI API error ({}): {}", status, error_text));
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .context("Failed to parse OpenAI response")?;

        let choice = chat_response.choices.first().context("No choices returned from OpenAI")?;

        Ok(CompletionResponse {
            content: choice.message.content.trim().to_string(),
            usage: chat_response.usage.into(),
        })
    }
}

// -----------------------------------------------------------------------------
// OpenAI DTOs (Data Transfer Objects)
// -----------------------------------------------------------------------------

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ApiMessage>,
    temperature: f64,
    top_p: f64,
    max_tokens: usize,
}

#[derive(Serialize)]
struct ApiMessage {
    role: Role,
    content: String,
}

impl From<&Message> for ApiMessage {
    fn from(msg: &Message) -> Self {
        Self {
            role: msg.role,
            content: msg.content.clone(),
        }
    }
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: ApiUsage,
}

#[derive(Deserialize)]
struct Choice {
    message: ApiResponseMessage,
}

#[derive(Deserialize)]
struct ApiResponseMessage {
    content: String,
}

#[derive(Deserialize, Default)]
struct ApiUsage {
    prompt_tokens: usize,
    completion_tokens: usize,
}

impl From<ApiUsage> for Usage {
    fn from(u: ApiUsage) -> Self {
        Usage::new(u.prompt_tokens, u.completion_tokens)
    }
}
