//! Local embeddings using Candle (pure Rust)
//!
//! Runs a sentence-transformers BERT model downloaded from the Hugging Face
//! hub. Embeddings are mean-pooled over the attention mask and L2-normalized.

use crate::config::{DevicePreference, EmbeddingModel};
use anyhow::{Context, Result};
use candle_core::{Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig, DTYPE};
use hf_hub::{api::sync::ApiBuilder, Repo, RepoType};
use tokenizers::Tokenizer;

/// Turns text into fixed-dimension vectors
pub trait EmbeddingProvider: Send + Sync {
    /// Embed many texts; one vector per input, in order
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Dimension of every returned vector
    fn dimension(&self) -> usize;

    /// Embed a single text
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text.to_string()])?
            .into_iter()
            .next()
            .context("Embedding provider returned no vector")
    }
}

pub struct Embedder {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    dimensions: usize,
}

impl Embedder {
    /// Create an embedder for the given model
    pub fn new_with_model(
        embedding_model: &EmbeddingModel,
        device: &DevicePreference,
        show_progress: bool,
    ) -> Result<Self> {
        let device = resolve_device(device)?;
        let model_id = embedding_model.hf_id();
        let dimensions = embedding_model.dimensions();

        if show_progress {
            eprintln!("  {} ({} MB)", embedding_model.name(), embedding_model.size_mb());
        }
        tracing::debug!(model = model_id, ?device, "loading embedding model");

        // Download model files from HuggingFace with progress
        let api = ApiBuilder::new()
            .with_progress(show_progress)
            .build()
            .context("Failed to create HuggingFace API")?;
        let repo = api.repo(Repo::new(model_id.to_string(), RepoType::Model));

        let config_path = repo.get("config.json").context("Failed to get config.json")?;
        let tokenizer_path = repo.get("tokenizer.json").context("Failed to get tokenizer.json")?;
        let weights_path = repo.get("model.safetensors").context("Failed to get model.safetensors")?;

        let config_str = std::fs::read_to_string(&config_path)?;
        let bert_config: BertConfig = serde_json::from_str(&config_str)?;

        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow::anyhow!("Failed to load tokenizer: {}", e))?;

        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[weights_path], DTYPE, &device)?
        };
        let model = BertModel::load(vb, &bert_config)?;

        Ok(Self {
            model,
            tokenizer,
            device,
            dimensions,
        })
    }
}

impl EmbeddingProvider for Embedder {
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        // BERT models have max 512 position embeddings - must truncate
        const MAX_SEQ_LEN: usize = 512;

        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let tokens = self.tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| anyhow::anyhow!("Tokenization failed: {}", e))?;

        let max_len = tokens.iter()
            .map(|t| t.get_ids().len().min(MAX_SEQ_LEN))
            .max()
            .unwrap_or(0);

        let mut input_ids_vec = Vec::with_capacity(texts.len() * max_len);
        let mut attention_mask_vec = Vec::with_capacity(texts.len() * max_len);

        for encoding in &tokens {
            let mut ids: Vec<u32> = encoding.get_ids().iter().take(MAX_SEQ_LEN).copied().collect();
            let mut mask: Vec<u32> = encoding.get_attention_mask().iter().take(MAX_SEQ_LEN).copied().collect();

            ids.resize(max_len, 0);
            mask.resize(max_len, 0);

            input_ids_vec.extend(ids);
            attention_mask_vec.extend(mask);
        }

        let batch_size = texts.len();

        let input_ids = Tensor::from_vec(input_ids_vec, (batch_size, max_len), &self.device)?;
        let attention_mask = Tensor::from_vec(attention_mask_vec, (batch_size, max_len), &self.device)?;
        let token_type_ids = input_ids.zeros_like()?;

        let embeddings = self.model.forward(&input_ids, &token_type_ids, Some(&attention_mask))?;

        // Mean pooling over sequence dimension
        let attention_mask_f = attention_mask.to_dtype(DTYPE)?;
        let mask_expanded = attention_mask_f.unsqueeze(2)?.broadcast_as(embeddings.shape())?;

        let sum_embeddings = (embeddings * mask_expanded)?.sum(1)?;
        let sum_mask = attention_mask_f.sum(1)?.unsqueeze(1)?;
        let mean_embeddings = sum_embeddings.broadcast_div(&sum_mask)?;

        let norms = mean_embeddings.sqr()?.sum(1)?.sqrt()?.unsqueeze(1)?;
        let normalized = mean_embeddings.broadcast_div(&norms)?;

        Ok(normalized.to_vec2()?)
    }

    fn dimension(&self) -> usize {
        self.dimensions
    }
}

/// Pick the compute device for a preference, falling back to CPU on `Auto`
pub fn resolve_device(preference: &DevicePreference) -> Result<Device> {
    let device = match preference {
        DevicePreference::Cpu => Device::Cpu,
        DevicePreference::Cuda => Device::new_cuda(0).context("CUDA device unavailable")?,
        DevicePreference::Metal => Device::new_metal(0).context("Metal device unavailable")?,
        DevicePreference::Auto => {
            if candle_core::utils::cuda_is_available() {
                Device::new_cuda(0)?
            } else if candle_core::utils::metal_is_available() {
                Device::new_metal(0)?
            } else {
                Device::Cpu
            }
        }
    };
    Ok(device)
}
