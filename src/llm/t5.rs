//! Candle-based local answer generation (Flan-T5).
//!
//! Runs a T5 encoder-decoder locally with the `candle` crate. No external
//! API calls, pure Rust inference.

use super::provider::{LLMProvider, ModelMetadata};
use super::types::{CompletionResponse, Message, Role, Usage};
use crate::config::{DevicePreference, GenerationConfig};
use crate::embed::resolve_device;
use anyhow::{Context, Result};
use async_trait::async_trait;
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::generation::{LogitsProcessor, Sampling};
use candle_transformers::models::t5::{Config as T5Config, T5ForConditionalGeneration};
use hf_hub::{api::tokio::Api, Repo, RepoType};
use std::sync::Mutex;
use tokenizers::Tokenizer;

const CONFIG_FILE: &str = "config.json";
const TOKENIZER_FILE: &str = "tokenizer.json";
const MODEL_FILE: &str = "model.safetensors";

/// T5 models use relative position buckets; 512 is the trained length
const CONTEXT_WINDOW: usize = 512;

/// Local provider using Candle
pub struct T5Provider {
    // encode/decode mutate the KV cache
    model: Mutex<T5ForConditionalGeneration>,
    tokenizer: Tokenizer,
    device: Device,
    config: T5Config,
    model_id: String,
    settings: GenerationConfig,
}

impl T5Provider {
    pub async fn new(settings: &GenerationConfig, device: &DevicePreference) -> Result<Self> {
        let device = resolve_device(device)?;
        let model_id = settings.local_model.clone();
        tracing::debug!(model = %model_id, ?device, "loading generation model");

        let api = Api::new().context("Failed to create HuggingFace API")?;
        let repo = api.repo(Repo::new(model_id.clone(), RepoType::Model));

        let config_path = repo.get(CONFIG_FILE).await.context("Failed to fetch config")?;
        let tokenizer_path = repo.get(TOKENIZER_FILE).await.context("Failed to fetch tokenizer")?;
        let weights_path = repo.get(MODEL_FILE).await.context("Failed to fetch weights")?;

        let mut config: T5Config = serde_json::from_slice(&std::fs::read(&config_path)?)?;
        config.use_cache = true;
        let tokenizer = Tokenizer::from_file(tokenizer_path).map_err(anyhow::Error::msg)?;

        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[weights_path], DType::F32, &device)?
        };
        let model = T5ForConditionalGeneration::load(vb, &config)?;

        Ok(Self {
            model: Mutex::new(model),
            tokenizer,
            device,
            config,
            model_id,
            settings: settings.clone(),
        })
    }

    /// Sample up to `max_new_tokens` decoder tokens for an encoded prompt
    fn generate_ids(&self, prompt_ids: &[u32]) -> Result<Vec<u32>> {
        let mut model = self
            .model
            .lock()
            .map_err(|_| anyhow::anyhow!("T5 model lock poisoned"))?;
        model.clear_kv_cache();

        let input = Tensor::new(prompt_ids, &self.device)?.unsqueeze(0)?;
        let encoder_output = model.encode(&input)?;

        let start_token = self
            .config
            .decoder_start_token_id
            .unwrap_or(self.config.pad_token_id) as u32;
        let mut decoded = vec![start_token];
        let mut logits_processor = LogitsProcessor::from_sampling(
            self.settings.seed,
            Sampling::TopKThenTopP {
                k: self.settings.top_k,
                p: self.settings.top_p,
                temperature: self.settings.temperature,
            },
        );

        for step in 0..self.settings.max_new_tokens {
            // With the KV cache only the newest token is fed back
            let decoder_input = if step == 0 {
                Tensor::new(decoded.as_slice(), &self.device)?.unsqueeze(0)?
            } else {
                let last = decoded[decoded.len() - 1];
                Tensor::new(&[last], &self.device)?.unsqueeze(0)?
            };

            let logits = model
                .decode(&decoder_input, &encoder_output)?
                .squeeze(0)?
                .to_dtype(DType::F32)?;
            let next_token = logits_processor.sample(&logits)?;

            if next_token as usize == self.config.eos_token_id {
                break;
            }
            decoded.push(next_token);
        }

        Ok(decoded.split_off(1))
    }
}

#[async_trait]
impl LLMProvider for T5Provider {
    fn metadata(&self) -> ModelMetadata {
        ModelMetadata {
            id: self.model_id.clone(),
            context_window: CONTEXT_WINDOW,
            encoder_decoder: true,
        }
    }

    fn count_tokens(&self, text: &str) -> Result<usize> {
        let encoding = self.tokenizer.encode(text, true).map_err(anyhow::Error::msg)?;
        Ok(encoding.get_ids().len())
    }

    async fn completion(&self, messages: &[Message]) -> Result<CompletionResponse> {
        let prompt = format_t5_prompt(messages);
        let encoding = self.tokenizer.encode(prompt, true).map_err(anyhow::Error::msg)?;
        let prompt_ids = encoding.get_ids();

        let output_ids = self.generate_ids(prompt_ids)?;
        let text = self
            .tokenizer
            .decode(&output_ids, true)
            .map_err(anyhow::Error::msg)?;

        Ok(CompletionResponse {
            content: text.trim().to_string(),
            usage: Usage::new(prompt_ids.len(), output_ids.len()),
        })
    }
}

/// T5 has no chat template: instructions and turns become plain paragraphs
fn format_t5_prompt(messages: &[Message]) -> String {
    messages
        .iter()
        .map(|msg| match msg.role {
            Role::System | Role::User => msg.content.trim().to_string(),
            Role::Assistant => format!("Answer: {}", msg.content.trim()),
        })
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}
