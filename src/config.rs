//! Configuration management for pdfrag
//!
//! Model selection, chunking, retrieval and generation settings, persisted
//! as TOML in ~/.pdfrag/config.toml. Every section has defaults, so a
//! partial file (or none at all) is valid.

use crate::chunking::ChunkConfig;
use crate::llm::openai::OPENAI_API_URL;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Device preference for compute
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DevicePreference {
    /// GPU if available, else CPU
    #[default]
    Auto,
    Cpu,
    /// Metal GPU (macOS Apple Silicon)
    Metal,
    /// CUDA GPU (NVIDIA)
    Cuda,
}

impl DevicePreference {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Cpu => "cpu",
            Self::Metal => "metal",
            Self::Cuda => "cuda",
        }
    }
}

/// Available embedding models
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub enum EmbeddingModel {
    /// all-MiniLM-L6-v2 - 6 layers, smallest/fastest (default)
    #[default]
    AllMiniLmL6V2,
    /// all-MiniLM-L12-v2 - 12 layers, better quality than L6
    AllMiniLmL12V2,
    /// BGE Small - small footprint, strong retrieval scores
    BgeSmallEnV15,
    /// BGE Base - balanced quality and size
    BgeBaseEnV15,
}

impl EmbeddingModel {
    /// Display name for the model
    pub fn name(&self) -> &'static str {
        match self {
            Self::AllMiniLmL6V2 => "all-MiniLM-L6-v2",
            Self::AllMiniLmL12V2 => "all-MiniLM-L12-v2",
            Self::BgeSmallEnV15 => "bge-small-en-v1.5",
            Self::BgeBaseEnV15 => "bge-base-en-v1.5",
        }
    }

    /// HuggingFace model ID
    pub fn hf_id(&self) -> &'static str {
        match self {
            Self::AllMiniLmL6V2 => "sentence-transformers/all-MiniLM-L6-v2",
            Self::AllMiniLmL12V2 => "sentence-transformers/all-MiniLM-L12-v2",
            Self::BgeSmallEnV15 => "BAAI/bge-small-en-v1.5",
            Self::BgeBaseEnV15 => "BAAI/bge-base-en-v1.5",
        }
    }

    /// Embedding dimensions
    pub fn dimensions(&self) -> usize {
        match self {
            Self::AllMiniLmL6V2 => 384,
            Self::AllMiniLmL12V2 => 384,
            Self::BgeSmallEnV15 => 384,
            Self::BgeBaseEnV15 => 768,
        }
    }

    /// Approximate model size in MB
    pub fn size_mb(&self) -> u32 {
        match self {
            Self::AllMiniLmL6V2 => 86,
            Self::AllMiniLmL12V2 => 134,
            Self::BgeSmallEnV15 => 134,
            Self::BgeBaseEnV15 => 418,
        }
    }

    pub fn all() -> Vec<Self> {
        vec![
            Self::AllMiniLmL6V2,
            Self::AllMiniLmL12V2,
            Self::BgeSmallEnV15,
            Self::BgeBaseEnV15,
        ]
    }
}

/// Which backend answers questions
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum GenerationBackend {
    /// Local seq2seq model run with candle
    #[default]
    Local,
    /// OpenAI chat completions API
    OpenAI,
}

impl GenerationBackend {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::OpenAI => "openai",
        }
    }
}

/// Answer generation settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GenerationConfig {
    pub backend: GenerationBackend,
    /// HuggingFace ID of the local T5 model
    pub local_model: String,
    /// Model name sent to the OpenAI API
    pub openai_model: String,
    /// Chat completions endpoint; any OpenAI-compatible server works
    pub openai_base_url: String,
    pub max_new_tokens: usize,
    pub temperature: f64,
    pub top_p: f64,
    pub top_k: usize,
    pub seed: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            backend: GenerationBackend::default(),
            local_model: "google/flan-t5-large".to_string(),
            openai_model: "gpt-4o-mini".to_string(),
            openai_base_url: OPENAI_API_URL.to_string(),
            max_new_tokens: 512,
            temperature: 0.7,
            top_p: 0.9,
            top_k: 50,
            seed: 299792458,
        }
    }
}

/// Retrieval settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Chunks retrieved per question
    pub top_k: usize,
    /// Tokens reserved for the generated answer when sizing the prompt
    pub answer_tokens: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 3,
            answer_tokens: 256,
        }
    }
}

/// pdfrag configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Selected embedding model
    #[serde(default)]
    pub embedding_model: EmbeddingModel,
    /// Device preference (auto, cpu, metal, cuda)
    #[serde(default)]
    pub device: DevicePreference,
    /// Version of config schema (for future migrations)
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub chunking: ChunkConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
}

fn default_version() -> u32 {
    1
}

impl Default for Config {
    fn default() -> Self {
        Self {
            embedding_model: EmbeddingModel::default(),
            device: DevicePreference::default(),
            version: default_version(),
            chunking: ChunkConfig::default(),
            retrieval: RetrievalConfig::default(),
            generation: GenerationConfig::default(),
        }
    }
}

impl Config {
    /// Get the config file path (~/.pdfrag/config.toml)
    pub fn path() -> Result<PathBuf> {
        Ok(pdfrag_dir()?.join("config.toml"))
    }

    /// Load config from disk, or return None if it doesn't exist
    pub fn load() -> Result<Option<Self>> {
        Self::load_from(&Self::path()?)
    }

    /// Load config from disk, falling back to defaults when absent
    pub fn load_or_default() -> Result<Self> {
        Ok(Self::load()?.unwrap_or_default())
    }

    pub fn load_from(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path)
            .context("Failed to read config file")?;
        let config: Self = toml::from_str(&content)
            .context("Failed to parse config file")?;
        config.chunking.validate()
            .with_context(|| format!("Invalid [chunking] section in {}", path.display()))?;
        Ok(Some(config))
    }

    /// Save config to disk
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .context("Failed to create config directory")?;
        }

        let content = toml::to_string_pretty(self)
            .context("Failed to serialize config")?;
        std::fs::write(path, content)
            .context("Failed to write config file")?;

        Ok(())
    }
}

/// Get the base directory path (~/.pdfrag)
pub fn pdfrag_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not find home directory")?;
    Ok(home.join(".pdfrag"))
}
