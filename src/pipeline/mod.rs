//! Session loading pipeline helpers

pub mod progress;

pub use progress::ProgressTracker;

/// Chunks embedded per provider call
pub const EMBED_BATCH_SIZE: usize = 32;
