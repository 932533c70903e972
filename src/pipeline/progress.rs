//! Progress Tracker for session loading
//!
//! Prints "phase... done" lines while a document is extracted, chunked,
//! embedded and indexed.

use std::io::{self, Write};
use std::time::Instant;

/// Tracks and displays progress while a session is built
pub struct ProgressTracker {
    /// Number of pages extracted
    pages: usize,
    /// Number of chunks embedded
    embedded_chunks: usize,
    /// Current phase name and its start time
    current_phase: Option<(String, Instant)>,
    /// Whether to show output (false for tests/quiet mode)
    show_output: bool,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self {
            pages: 0,
            embedded_chunks: 0,
            current_phase: None,
            show_output: true,
        }
    }

    /// Create a quiet progress tracker (no output)
    pub fn quiet() -> Self {
        Self {
            show_output: false,
            ..Self::new()
        }
    }

    /// Start a new phase of processing, finishing any open one
    pub fn start_phase(&mut self, phase: &str) {
        self.finish_phase();
        self.current_phase = Some((phase.to_string(), Instant::now()));
        if self.show_output {
            eprint!("  {}... ", phase);
            let _ = io::stderr().flush();
        }
    }

    /// Finish the current phase
    pub fn finish_phase(&mut self) {
        if let Some((phase, started)) = self.current_phase.take() {
            tracing::debug!(phase = %phase, elapsed_ms = started.elapsed().as_millis() as u64, "phase finished");
            if self.show_output {
                eprintln!("done");
            }
        }
    }

    pub fn set_pages(&mut self, pages: usize) {
        self.pages = pages;
    }

    pub fn update_chunks(&mut self, count: usize) {
        self.embedded_chunks += count;
    }

    pub fn pages(&self) -> usize {
        self.pages
    }

    pub fn chunks_embedded(&self) -> usize {
        self.embedded_chunks
    }

    pub fn is_in_phase(&self) -> bool {
        self.current_phase.is_some()
    }

    /// Display final completion message
    pub fn complete(&mut self) {
        self.finish_phase();
        if self.show_output {
            eprintln!(
                "  Ready: {} pages, {} chunks",
                self.pages, self.embedded_chunks
            );
        }
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}
