//! Errors raised by the chunking layer.
//!
//! Everything above the chunker (extraction, models, HTTP) reports through
//! `anyhow`; only configuration mistakes originate here.

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ChunkError {
    #[error("Invalid chunking configuration: {0}")]
    InvalidConfiguration(String),
}
