//! LLM layer: answer generation
//!
//! - Provider abstraction (OpenAI, local Flan-T5)
//! - Context management (token counting, fitting chunks into the window)

pub mod context;
pub mod openai;
pub mod provider;
pub mod t5;
pub mod types;

pub use context::WindowManager;
pub use openai::OpenAIProvider;
pub use provider::LLMProvider;
pub use t5::T5Provider;
pub use types::{CompletionResponse, Message, Role};
