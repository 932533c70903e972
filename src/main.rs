//! pdfrag CLI
//!
//! Commands:
//!   chunks - Extract, clean and chunk a PDF, then print the chunks
//!   search - Show the chunks closest to a query
//!   ask    - Answer one question from a PDF
//!   chat   - Interactive question answering over a PDF
//!   init   - Choose models and chunking settings
//!   info   - Show the active configuration

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::*;
use pdfrag::init::show_config;
use pdfrag::repl::{print_answer, print_results, run_chat};
use pdfrag::{
    run_init, Config, Document, Embedder, EmbeddingProvider, GenerationBackend, InitResult,
    LLMProvider, OpenAIProvider, OverlapPolicy, PdfExtractor, ProgressTracker, SentenceChunker,
    Session, T5Provider,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pdfrag")]
#[command(about = "Ask questions about a PDF using local embeddings")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    overrides: Overrides,

    #[command(subcommand)]
    command: Commands,
}

/// Per-run settings layered over ~/.pdfrag/config.toml
#[derive(Args)]
struct Overrides {
    /// Target maximum chunk length in characters
    #[arg(long, global = true)]
    chunk_size: Option<usize>,

    /// Carry this many trailing sentences into the next chunk
    #[arg(long, global = true, conflicts_with = "overlap_ratio")]
    overlap_sentences: Option<usize>,

    /// Carry this fraction of chunk_size (in characters) into the next chunk
    #[arg(long, global = true)]
    overlap_ratio: Option<f64>,

    /// Backend that generates answers
    #[arg(long, global = true, value_enum)]
    backend: Option<Backend>,

    /// API key for the openai backend
    #[arg(long, global = true, env = "OPENAI_API_KEY", hide_env_values = true)]
    openai_api_key: Option<String>,

    /// Hide progress output
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Backend {
    Local,
    Openai,
}

impl Overrides {
    fn apply(&self, config: &mut Config) {
        if let Some(chunk_size) = self.chunk_size {
            config.chunking.chunk_size = chunk_size;
        }
        if let Some(count) = self.overlap_sentences {
            config.chunking.overlap = OverlapPolicy::SentenceCount { count };
        }
        if let Some(ratio) = self.overlap_ratio {
            config.chunking.overlap = OverlapPolicy::CharRatio { ratio };
        }
        if let Some(backend) = self.backend {
            config.generation.backend = match backend {
                Backend::Local => GenerationBackend::Local,
                Backend::Openai => GenerationBackend::OpenAI,
            };
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Extract and chunk a PDF, printing the chunks
    Chunks {
        /// Path to the PDF
        pdf: PathBuf,

        /// Print chunks as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the chunks closest to a query
    Search {
        /// Path to the PDF
        pdf: PathBuf,

        /// Search query
        query: String,

        /// Number of chunks to return (defaults to retrieval.top_k)
        #[arg(short, long)]
        k: Option<usize>,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Answer a question from a PDF
    Ask {
        /// Path to the PDF
        pdf: PathBuf,

        /// The question
        question: String,

        /// Also print the chunks the answer was generated from
        #[arg(long)]
        sources: bool,
    },

    /// Load a PDF and answer questions interactively
    Chat {
        /// Path to the PDF
        pdf: PathBuf,
    },

    /// Run initialization flow (choose models and chunking)
    Init {
        /// Use default settings without prompts (for CI/scripting)
        #[arg(long)]
        default: bool,
    },

    /// Show the active configuration
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Chunks { pdf, json } => {
            let config = load_config(&cli.overrides)?;
            let chunker = SentenceChunker::new(config.chunking)?;
            let document = Document::load(&pdf, &PdfExtractor::new(), &chunker)?;

            if json {
                println!("{}", serde_json::to_string_pretty(document.chunks())?);
                return Ok(());
            }

            println!(
                "{} {} ({} pages, {} sentences, {} chunks)\n",
                "Chunked".green().bold(),
                document.source,
                document.page_count,
                document.sentences().len(),
                document.chunks().len()
            );
            for chunk in document.chunks() {
                println!(
                    "{} {}",
                    format!("#{}", chunk.index).cyan().bold(),
                    format!("({} chars)", chunk.char_len()).dimmed()
                );
                println!("{}\n", chunk.text);
            }
        }

        Commands::Search { pdf, query, k, json } => {
            let config = load_config(&cli.overrides)?;
            let session = open_session(&pdf, &config, cli.overrides.quiet)?;
            let results = session.retrieve(&query, k.unwrap_or(session.top_k()))?;

            if json {
                println!("{}", serde_json::to_string_pretty(&results)?);
            } else {
                print_results(&results);
            }
        }

        Commands::Ask { pdf, question, sources } => {
            let config = load_config(&cli.overrides)?;
            let generator = build_generator(&config, cli.overrides.openai_api_key.clone()).await?;
            let session = open_session(&pdf, &config, cli.overrides.quiet)?;

            let answer = session.ask(&question, generator.as_ref()).await?;
            println!();
            print_answer(&answer);
            if sources {
                println!();
                print_results(&answer.sources);
            }
        }

        Commands::Chat { pdf } => {
            let config = load_config(&cli.overrides)?;
            let generator = build_generator(&config, cli.overrides.openai_api_key.clone()).await?;
            let session = open_session(&pdf, &config, cli.overrides.quiet)?;
            run_chat(&session, generator.as_ref()).await?;
        }

        Commands::Init { default } => {
            // Non-interactive mode for CI/scripting
            let config = if default {
                let config = Config::default();
                config.save()?;
                println!("Configuration saved with defaults.");
                config
            } else {
                let existing = Config::load()?;
                match run_init(existing.as_ref())? {
                    InitResult::Configured(config) => {
                        println!("\n{} Configuration saved!", "✓".green());
                        config
                    }
                    InitResult::Cancelled => {
                        println!("Cancelled.");
                        return Ok(());
                    }
                }
            };

            println!("\nDownloading embedding model...");
            Embedder::new_with_model(&config.embedding_model, &config.device, true)?;
            println!("\nSetup complete!");
        }

        Commands::Info => {
            println!("pdfrag - question answering over a PDF\n");

            match Config::load()? {
                Some(mut config) => {
                    cli.overrides.apply(&mut config);
                    show_config(&config);
                }
                None => {
                    println!("Not initialized, using defaults. Run 'pdfrag init' to set up.");
                    let mut config = Config::default();
                    cli.overrides.apply(&mut config);
                    show_config(&config);
                }
            }

            println!("\nConfig file: {}", Config::path()?.display());
        }
    }

    Ok(())
}

/// Log to stderr; RUST_LOG overrides the default `warn` level
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(overrides: &Overrides) -> Result<Config> {
    let mut config = Config::load_or_default()?;
    overrides.apply(&mut config);
    config.chunking.validate()?;
    Ok(config)
}

fn open_session(pdf: &Path, config: &Config, quiet: bool) -> Result<Session> {
    if !pdf.exists() {
        anyhow::bail!("File not found: {}", pdf.display());
    }

    let embedder: Arc<dyn EmbeddingProvider> = Arc::new(Embedder::new_with_model(
        &config.embedding_model,
        &config.device,
        !quiet,
    )?);
    let mut progress = if quiet { ProgressTracker::quiet() } else { ProgressTracker::new() };

    Session::load(pdf, config, &PdfExtractor::new(), embedder, &mut progress)
}

async fn build_generator(config: &Config, api_key: Option<String>) -> Result<Box<dyn LLMProvider>> {
    match config.generation.backend {
        GenerationBackend::Local => {
            let provider = T5Provider::new(&config.generation, &config.device)
                .await
                .context("Failed to load local generation model")?;
            Ok(Box::new(provider))
        }
        GenerationBackend::OpenAI => {
            let api_key = api_key
                .context("The openai backend needs an API key (set OPENAI_API_KEY or pass --openai-api-key)")?;
            Ok(Box::new(OpenAIProvider::from_config(api_key, &config.generation)))
        }
    }
}
