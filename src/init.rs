//! Initialization flow for pdfrag
//!
//! Interactive first-run setup: embedding model, answer backend and chunk
//! overlap policy, saved to ~/.pdfrag/config.toml.

use crate::chunking::{OverlapPolicy, DEFAULT_OVERLAP_RATIO, DEFAULT_OVERLAP_SENTENCES};
use crate::config::{Config, EmbeddingModel, GenerationBackend};
use anyhow::Result;
use std::io::{self, Write};

/// Result of running the init flow
#[derive(Debug)]
pub enum InitResult {
    /// User completed init with this config
    Configured(Config),
    /// User cancelled the init
    Cancelled,
}

/// Run the interactive init flow
pub fn run_init(existing_config: Option<&Config>) -> Result<InitResult> {
    if let Some(config) = existing_config {
        println!("\nCurrent configuration:");
        show_config(config);
        println!();
    }

    let defaults = Config::default();
    println!(
        "[D] Default - {} embeddings, {} answers ({}), {}-char chunks",
        defaults.embedding_model.name(),
        defaults.generation.backend.name(),
        defaults.generation.local_model,
        defaults.chunking.chunk_size
    );
    println!("[C] Custom  - Choose your settings");
    println!("[Q] Quit");
    println!();

    let input = read_line("Choice [D/c/q]: ")?.to_lowercase();

    let config = match input.as_str() {
        "q" | "quit" => return Ok(InitResult::Cancelled),
        "c" | "custom" => run_custom_selection(existing_config)?,
        _ => defaults,
    };

    config.save()?;

    Ok(InitResult::Configured(config))
}

/// Run custom selection, starting from the existing config if any
fn run_custom_selection(existing_config: Option<&Config>) -> Result<Config> {
    let mut config = existing_config.cloned().unwrap_or_default();

    let models = EmbeddingModel::all();
    let labels: Vec<String> = models
        .iter()
        .map(|m| format!("{} ({}MB, {} dims)", m.name(), m.size_mb(), m.dimensions()))
        .collect();
    let current = models.iter().position(|m| *m == config.embedding_model).unwrap_or(0);
    config.embedding_model = models[select("Embedding model:", &labels, current)?].clone();

    let backends = [GenerationBackend::Local, GenerationBackend::OpenAI];
    let labels = vec![
        format!("local ({})", config.generation.local_model),
        format!("openai ({}, needs OPENAI_API_KEY)", config.generation.openai_model),
    ];
    let current = backends.iter().position(|b| *b == config.generation.backend).unwrap_or(0);
    config.generation.backend = backends[select("Answer backend:", &labels, current)?];

    let labels = vec![
        format!("last {} sentences", DEFAULT_OVERLAP_SENTENCES),
        format!("last {:.0}% of chunk size in characters", DEFAULT_OVERLAP_RATIO * 100.0),
    ];
    let current = match config.chunking.overlap {
        OverlapPolicy::SentenceCount { .. } => 0,
        OverlapPolicy::CharRatio { .. } => 1,
    };
    config.chunking.overlap = match select("Chunk overlap:", &labels, current)? {
        0 => OverlapPolicy::SentenceCount { count: DEFAULT_OVERLAP_SENTENCES },
        _ => OverlapPolicy::CharRatio { ratio: DEFAULT_OVERLAP_RATIO },
    };

    Ok(config)
}

/// Print numbered options and read a choice
fn select(title: &str, labels: &[String], default_idx: usize) -> Result<usize> {
    println!();
    println!("{}", title);
    for (i, label) in labels.iter().enumerate() {
        let current_marker = if i == default_idx { " ← current" } else { "" };
        println!("  [{}] {}{}", i + 1, label, current_marker);
    }
    println!();

    let input = read_line(&format!("Choice [{}]: ", default_idx + 1))?;
    let choice = parse_choice(&input, labels.len(), default_idx);
    if choice.is_none() {
        println!("Invalid selection, using default.");
    }
    Ok(choice.unwrap_or(default_idx))
}

/// 1-based menu input to a 0-based index; empty input picks the default
fn parse_choice(input: &str, len: usize, default_idx: usize) -> Option<usize> {
    let input = input.trim();
    if input.is_empty() {
        return Some(default_idx);
    }
    match input.parse::<usize>() {
        Ok(n) if n >= 1 && n <= len => Some(n - 1),
        _ => None,
    }
}

fn read_line(prompt: &str) -> Result<String> {
    print!("{}", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

/// Display the active configuration
pub fn show_config(config: &Config) {
    println!("  Embedding: {} ({} dims)", config.embedding_model.name(), config.embedding_model.dimensions());
    let model = match config.generation.backend {
        GenerationBackend::Local => &config.generation.local_model,
        GenerationBackend::OpenAI => &config.generation.openai_model,
    };
    println!("  Answers:   {} ({})", config.generation.backend.name(), model);
    println!("  Chunks:    {} chars, overlap {}", config.chunking.chunk_size, describe_overlap(&config.chunking.overlap));
    println!("  Retrieval: top {}", config.retrieval.top_k);
    println!("  Device:    {}", config.device.name());
}

pub fn describe_overlap(policy: &OverlapPolicy) -> String {
    match policy {
        OverlapPolicy::SentenceCount { count } => format!("{} sentences", count),
        OverlapPolicy::CharRatio { ratio } => format!("{:.0}% chars", ratio * 100.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_choice_default_on_empty() {
        assert_eq!(parse_choice("", 3, 1), Some(1));
        assert_eq!(parse_choice("  \n", 3, 2), Some(2));
    }

    #[test]
    fn test_parse_choice_valid() {
        assert_eq!(parse_choice("1", 3, 2), Some(0));
        assert_eq!(parse_choice("3", 3, 0), Some(2));
    }

    #[test]
    fn test_parse_choice_invalid() {
        assert_eq!(parse_choice("0", 3, 0), None);
        assert_eq!(parse_choice("4", 3, 0), None);
        assert_eq!(parse_choice("abc", 3, 0), None);
    }

    #[test]
    fn test_describe_overlap() {
        assert_eq!(describe_overlap(&OverlapPolicy::SentenceCount { count: 2 }), "2 sentences");
        assert_eq!(describe_overlap(&OverlapPolicy::CharRatio { ratio: 0.15 }), "15% chars");
    }
}
