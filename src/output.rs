//! Result types returned by the translation entry points.

use serde::{Deserialize, Serialize};

/// A translated document plus run statistics.
#[derive(Debug, Clone)]
pub struct TranslationOutput {
    /// The serialised `.docx` bytes.
    pub bytes: Vec<u8>,
    pub stats: TranslationStats,
}

/// Counters for one translated document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationStats {
    /// Top-level paragraphs in the document, empty ones included.
    pub total_paragraphs: usize,
    /// Paragraphs whose text was replaced by a model response.
    pub translated_paragraphs: usize,
    /// Empty or whitespace-only paragraphs passed through untouched.
    pub skipped_paragraphs: usize,
    /// Wall-clock time spent in completion calls.
    pub llm_duration_ms: u64,
    /// Wall-clock time for the whole document.
    pub total_duration_ms: u64,
}
